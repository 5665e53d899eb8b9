//! Capture sources.
//!
//! A `CaptureSource` hands the driver loop raw RGB frames. An empty read
//! (`Ok(None)`) is a transient condition: the loop retries with a short
//! backoff, bounded by a consecutive-empty limit so a dead device cannot
//! spin the process forever.
//!
//! Backends:
//! - `stub://...` devices map to the synthetic source (tests, demos)
//! - anything else is treated as a V4L2 device node (feature `ingest-v4l2`)

#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod stub;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};
use std::time::Duration;

use crate::config::CaptureSettings;
use crate::frame::Frame;

pub use stub::StubSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

pub trait CaptureSource {
    /// Capture the next frame. `Ok(None)` signals an empty read that the
    /// caller may retry.
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Idempotent.
    fn release(&mut self) -> Result<()>;
}

/// Pick a capture backend from the configured device string.
pub fn open_source(settings: &CaptureSettings) -> Result<Box<dyn CaptureSource>> {
    if settings.device.starts_with("stub://") {
        log::info!("capture source: {} (synthetic)", settings.device);
        return Ok(Box::new(StubSource::new(
            settings.width,
            settings.height,
            settings.fps,
        )));
    }

    #[cfg(feature = "ingest-v4l2")]
    {
        log::info!("capture source: {} (v4l2)", settings.device);
        let mut source = V4l2Source::new(settings.clone());
        source.connect()?;
        return Ok(Box::new(source));
    }

    #[cfg(not(feature = "ingest-v4l2"))]
    Err(anyhow!(
        "device '{}' requires the ingest-v4l2 feature",
        settings.device
    ))
}

/// Read with bounded retry over empty reads.
///
/// Retries up to `max_empty_reads` consecutive empties, sleeping `backoff`
/// between attempts, then fails so the daemon terminates with a reported
/// error instead of busy-looping on a dead device.
pub fn read_with_retry(
    source: &mut dyn CaptureSource,
    max_empty_reads: u32,
    backoff: Duration,
) -> Result<Frame> {
    let mut empties = 0u32;
    loop {
        match source.read()? {
            Some(frame) => return Ok(frame),
            None => {
                empties += 1;
                if empties >= max_empty_reads {
                    return Err(anyhow!(
                        "{} consecutive empty reads from capture source",
                        empties
                    ));
                }
                log::warn!("empty frame read, retrying ({}/{})", empties, max_empty_reads);
                std::thread::sleep(backoff);
            }
        }
    }
}
