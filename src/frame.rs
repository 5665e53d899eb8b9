//! Frame container.
//!
//! A `Frame` is an immutable RGB24 image captured from a thermal source.
//! The pixel buffer is private: once constructed a frame cannot be mutated,
//! so the classifier always works on a stable input and produces a new
//! annotated frame instead of drawing over the original.

use anyhow::{anyhow, Result};
use image::RgbImage;
use std::time::{SystemTime, UNIX_EPOCH};

/// Immutable RGB24 frame with a capture timestamp in epoch milliseconds.
#[derive(Debug)]
pub struct Frame {
    /// Private pixel data, 3 bytes per pixel, row-major.
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl Frame {
    /// Create a frame from raw RGB24 bytes. Fails when the buffer length
    /// does not match `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ms: u64) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ms,
        })
    }

    /// Wrap an owned `RgbImage`, e.g. an annotated copy produced by the
    /// classifier. The timestamp is carried over from the source frame.
    pub fn from_rgb_image(image: RgbImage, timestamp_ms: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            timestamp_ms,
        }
    }

    /// Read-only view of the pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Copy into an `RgbImage` for the vision primitives.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame buffer length was validated at construction")
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_validates_buffer_length() {
        assert!(Frame::new(vec![0u8; 12], 2, 2, 0).is_ok());
        assert!(Frame::new(vec![0u8; 11], 2, 2, 0).is_err());
        assert!(Frame::new(vec![0u8; 13], 2, 2, 0).is_err());
    }

    #[test]
    fn rgb_image_round_trip_preserves_pixels() {
        let data: Vec<u8> = (0..12).collect();
        let frame = Frame::new(data.clone(), 2, 2, 42).unwrap();
        let img = frame.to_rgb_image();
        assert_eq!(img.as_raw(), &data);
        let back = Frame::from_rgb_image(img, frame.timestamp_ms);
        assert_eq!(back.pixels(), frame.pixels());
        assert_eq!(back.timestamp_ms, 42);
    }
}
