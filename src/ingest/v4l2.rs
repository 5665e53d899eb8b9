//! V4L2 capture source (feature `ingest-v4l2`).
//!
//! Opens a local device node, negotiates RGB24 (falling back to whatever the
//! driver reports, with YUYV normalized in software), sets the configured
//! resolution and frame rate, and produces RGB frames for the driver loop.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use crate::config::CaptureSettings;
use crate::frame::{now_millis, Frame};
use crate::ingest::normalize::{normalize_to_rgb, PixelFormat};
use crate::ingest::CaptureSource;

pub struct V4l2Source {
    settings: CaptureSettings,
    state: Option<V4l2State>,
    format: PixelFormat,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            active_width: settings.width,
            active_height: settings.height,
            settings,
            state: None,
            format: PixelFormat::Rgb24,
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.settings.device)
            .with_context(|| format!("open v4l2 device {}", self.settings.device))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.settings.width;
        format.height = self.settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");
        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "failed to set RGB24 on {}: {}; using driver format",
                    self.settings.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.format = match &format.fourcc.repr {
            b"RGB3" => PixelFormat::Rgb24,
            b"YUYV" => PixelFormat::Yuyv,
            other => {
                return Err(anyhow!(
                    "unsupported v4l2 pixel format {}",
                    String::from_utf8_lossy(other)
                ))
            }
        };
        self.active_width = format.width;
        self.active_height = format.height;

        if self.settings.fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.settings.fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("failed to set fps on {}: {}", self.settings.device, err);
            }
        }

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "v4l2 device {} connected ({}x{}, {:?})",
            self.settings.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }
}

impl CaptureSource for V4l2Source {
    fn read(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;

        // Drivers occasionally deliver zero-length buffers; treat them as
        // transient empty reads.
        if buf.is_empty() {
            return Ok(None);
        }

        let rgb = normalize_to_rgb(buf, self.active_width, self.active_height, self.format)?;
        let frame = Frame::new(rgb, self.active_width, self.active_height, now_millis())?;
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        if self.state.take().is_some() {
            log::info!("v4l2 device {} released", self.settings.device);
        }
        Ok(())
    }
}
