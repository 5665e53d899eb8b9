//! Recording sink and retention sweep.
//!
//! Frames are appended to an MJPEG stream file (concatenated JPEG images),
//! one file per monitoring session, named by the session's epoch second.
//! Old recordings are swept by modification age, best-effort: a file that
//! cannot be inspected or removed is skipped, never fatal.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::frame::Frame;

const RECORDING_JPEG_QUALITY: u8 = 80;
const SECS_PER_DAY: u64 = 60 * 60 * 24;

pub trait RecordingSink {
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the sink. Idempotent.
    fn release(&mut self) -> Result<()>;
}

/// Concatenated-JPEG stream file sink.
pub struct MjpegFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    frames_written: u64,
}

impl MjpegFileSink {
    /// Create `dir/thermal_<epoch-secs>.mjpeg`, creating `dir` on demand.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create recording directory {}", dir.display()))?;
        let epoch_secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = dir.join(format!("thermal_{}.mjpeg", epoch_secs));
        let file = File::create(&path)
            .with_context(|| format!("create recording file {}", path.display()))?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl RecordingSink for MjpegFileSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("recording sink already released")?;
        let image = frame.to_rgb_image();
        let mut encoder = JpegEncoder::new_with_quality(&mut *writer, RECORDING_JPEG_QUALITY);
        encoder
            .encode_image(&image)
            .context("encode recording frame")?;
        self.frames_written += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().context("flush recording file")?;
            log::info!(
                "recording closed: {} ({} frames)",
                self.path.display(),
                self.frames_written
            );
        }
        Ok(())
    }
}

/// Delete regular files in `dir` whose modification age exceeds the horizon.
/// Returns the number of files removed. Best-effort per file.
pub fn sweep_expired(dir: &Path, retention_days: u64) -> usize {
    sweep_expired_at(dir, retention_days, SystemTime::now())
}

/// `sweep_expired` against an explicit reference time.
pub fn sweep_expired_at(dir: &Path, retention_days: u64, now: SystemTime) -> usize {
    // Saturate: an absurd retention simply keeps everything.
    let horizon = Duration::from_secs(retention_days.saturating_mul(SECS_PER_DAY));
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };
        if age > horizon && fs::remove_file(&path).is_ok() {
            log::info!("removed expired recording {}", path.display());
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![128u8; 16 * 12 * 3], 16, 12, 0).unwrap()
    }

    #[test]
    fn sink_appends_jpeg_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MjpegFileSink::create(dir.path()).unwrap();
        sink.write(&frame()).unwrap();
        sink.write(&frame()).unwrap();
        assert_eq!(sink.frames_written(), 2);
        let path = sink.path().to_path_buf();
        sink.release().unwrap();

        let bytes = fs::read(path).unwrap();
        // Two JPEG SOI markers.
        let soi_count = bytes.windows(2).filter(|w| w == &[0xff, 0xd8]).count();
        assert!(soi_count >= 2);
    }

    #[test]
    fn release_is_idempotent_and_write_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MjpegFileSink::create(dir.path()).unwrap();
        sink.release().unwrap();
        sink.release().unwrap();
        assert!(sink.write(&frame()).is_err());
    }

    #[test]
    fn sweep_removes_only_files_past_the_horizon() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("thermal_1.mjpeg");
        let fresh = dir.path().join("thermal_2.mjpeg");
        fs::write(&old, b"a").unwrap();
        fs::write(&fresh, b"b").unwrap();

        // Judge "old" from a reference time 4 days in the future; only a
        // 3-day horizon applied from there expires both, a 5-day none.
        let in_4_days = SystemTime::now() + Duration::from_secs(4 * SECS_PER_DAY);
        assert_eq!(sweep_expired_at(dir.path(), 5, in_4_days), 0);
        assert!(old.exists() && fresh.exists());

        assert_eq!(sweep_expired_at(dir.path(), 3, in_4_days), 2);
        assert!(!old.exists() && !fresh.exists());
    }

    #[test]
    fn absurd_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("thermal_1.mjpeg");
        fs::write(&file, b"a").unwrap();

        let far_future = SystemTime::now() + Duration::from_secs(10 * SECS_PER_DAY);
        assert_eq!(sweep_expired_at(dir.path(), u64::MAX, far_future), 0);
        assert!(file.exists());
    }

    #[test]
    fn sweep_of_missing_directory_is_a_noop() {
        assert_eq!(sweep_expired(Path::new("/nonexistent/heatwatch"), 3), 0);
    }
}
