//! Synthetic capture source.
//!
//! Produces a cool vertical gradient scene with a hot upright blob that
//! comes and goes, so a demo run exercises the whole pipeline including
//! fire/person detections and alert dispatch.

use anyhow::Result;
use std::time::Duration;

use crate::frame::{now_millis, Frame};
use crate::ingest::CaptureSource;

/// Frames per hot/cold phase of the synthetic scene.
const PHASE_FRAMES: u64 = 50;

pub struct StubSource {
    width: u32,
    height: u32,
    /// Per-read sleep so the synthetic source paces like a real device.
    frame_interval: Duration,
    frame_count: u64,
    released: bool,
}

impl StubSource {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        let frame_interval = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis((1000 / fps.max(1)) as u64)
        };
        Self {
            width,
            height,
            frame_interval,
            frame_count: 0,
            released: false,
        }
    }

    fn scene_pixels(&self) -> Vec<u8> {
        let mut data = vec![0u8; (self.width * self.height * 3) as usize];

        // Cool gradient background, warmer toward the bottom.
        for y in 0..self.height {
            let v = ((y * 160) / self.height.max(1)) as u8;
            for x in 0..self.width {
                let off = ((y * self.width + x) * 3) as usize;
                data[off] = v;
                data[off + 1] = v;
                data[off + 2] = v;
            }
        }

        // Every other phase: a maximum-intensity upright blob near the top.
        if (self.frame_count / PHASE_FRAMES) % 2 == 1 {
            let blob_w = (self.width / 12).max(2);
            let blob_h = (self.height / 4).max(4);
            let x0 = self.width / 8;
            let y0 = self.height / 12;
            for y in y0..(y0 + blob_h).min(self.height) {
                for x in x0..(x0 + blob_w).min(self.width) {
                    let off = ((y * self.width + x) * 3) as usize;
                    data[off] = 255;
                    data[off + 1] = 255;
                    data[off + 2] = 255;
                }
            }
        }

        data
    }
}

impl CaptureSource for StubSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        self.frame_count += 1;
        let frame = Frame::new(self.scene_pixels(), self.width, self.height, now_millis())?;
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}
