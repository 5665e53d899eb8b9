//! Frame decimation.
//!
//! Only every Nth captured frame is classified; the rest bypass the pipeline
//! and go straight to the recording sink unannotated. No detections, and
//! therefore no alerts, can come from a passthrough frame. This is an
//! accepted blind spot traded for throughput on constrained hardware.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleDecision {
    Process,
    Passthrough,
}

/// Stateless decimator over a monotonically increasing frame counter.
#[derive(Clone, Copy, Debug)]
pub struct FrameSampler {
    every_n: u64,
}

impl FrameSampler {
    /// `every_n` is clamped to at least 1 (process every frame).
    pub fn new(every_n: u64) -> Self {
        Self {
            every_n: every_n.max(1),
        }
    }

    pub fn decide(&self, counter: u64) -> SampleDecision {
        if counter % self.every_n == 0 {
            SampleDecision::Process
        } else {
            SampleDecision::Passthrough
        }
    }
}
