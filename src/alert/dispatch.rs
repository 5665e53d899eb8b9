//! Alert dispatch across the two quality tiers.
//!
//! For each configured channel, independently: skip when disabled or missing
//! credentials, consult the throttle, render a tier-specific snapshot, send
//! it with a caption, and record the send only when delivery succeeded. A
//! failed delivery is logged and leaves the cooldown untouched; the retry
//! happens naturally at the next eligible frame.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use std::time::Duration;

use crate::alert::{AlertThrottle, MessageChannel, Quality};
use crate::detect::Detection;
use crate::frame::Frame;

const SNAPSHOT_JPEG_QUALITY: u8 = 85;

/// Per-tier channel configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct ChannelSettings {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub cooldown: Duration,
}

impl ChannelSettings {
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    fn active(&self) -> bool {
        self.enabled && self.has_credentials()
    }
}

pub struct AlertDispatcher<C: MessageChannel> {
    channels: Vec<(Quality, ChannelSettings, C)>,
    throttle: AlertThrottle,
}

impl<C: MessageChannel> AlertDispatcher<C> {
    /// A dispatcher with no channels attached; tiers that could not be
    /// configured (missing credentials) are simply never added.
    pub fn new(high_cooldown: Duration, low_cooldown: Duration) -> Self {
        Self {
            channels: Vec::new(),
            throttle: AlertThrottle::new(high_cooldown, low_cooldown),
        }
    }

    pub fn with_channel(mut self, quality: Quality, settings: ChannelSettings, channel: C) -> Self {
        self.channels.push((quality, settings, channel));
        self
    }

    /// Dispatch one detection to every eligible channel. Returns the number
    /// of successful deliveries.
    pub fn dispatch(&mut self, detection: &Detection, frame: &Frame, now_ms: u64) -> usize {
        let mut sent = 0;
        for (quality, settings, channel) in &self.channels {
            let quality = *quality;
            if !settings.active() {
                log::debug!("{} channel inactive, skipping", quality.label());
                continue;
            }
            if !self.throttle.permit(detection.kind, quality, now_ms) {
                log::debug!(
                    "{} alert on {} channel in cooldown",
                    detection.kind,
                    quality.label()
                );
                continue;
            }

            let snapshot = match render_snapshot(frame, quality) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("snapshot render failed ({}): {:#}", quality.label(), e);
                    continue;
                }
            };
            let caption = alert_caption(detection, frame.timestamp_ms, quality);

            match channel.send_image(&settings.chat_id, &snapshot, &caption) {
                Ok(()) => {
                    self.throttle.record_sent(detection.kind, quality, now_ms);
                    sent += 1;
                    log::info!(
                        "{} alert sent on {} channel (area {} px^2)",
                        detection.kind,
                        quality.label(),
                        detection.area
                    );
                }
                Err(e) => {
                    log::warn!(
                        "{} alert delivery failed on {} channel: {:#}",
                        detection.kind,
                        quality.label(),
                        e
                    );
                }
            }
        }
        sent
    }

    /// Unthrottled one-shot text message to every active channel
    /// (startup/shutdown notices). Best-effort: failures are logged.
    pub fn send_notice(&self, message: &str) {
        for (quality, settings, channel) in &self.channels {
            if !settings.active() {
                continue;
            }
            if let Err(e) = channel.send_text(&settings.chat_id, message) {
                log::warn!("notice delivery failed on {} channel: {:#}", quality.label(), e);
            }
        }
    }
}

/// Render the tier-specific snapshot: high quality keeps the original
/// resolution, low quality halves both dimensions (integer floor).
pub fn render_snapshot(frame: &Frame, quality: Quality) -> Result<Vec<u8>> {
    let image = frame.to_rgb_image();
    let image = match quality {
        Quality::High => image,
        Quality::Low => {
            let w = (frame.width / 2).max(1);
            let h = (frame.height / 2).max(1);
            imageops::resize(&image, w, h, FilterType::Triangle)
        }
    };

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, SNAPSHOT_JPEG_QUALITY);
    encoder
        .encode_image(&image)
        .context("encode snapshot jpeg")?;
    Ok(bytes)
}

fn alert_caption(detection: &Detection, timestamp_ms: u64, quality: Quality) -> String {
    format!(
        "{} detected\narea: {} px^2\ntimestamp: {} ms\n[{} quality]",
        detection.kind, detection.area, timestamp_ms, quality.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, DetectionKind};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FakeChannel {
        sent_images: Rc<RefCell<Vec<(String, Vec<u8>, String)>>>,
        sent_texts: Rc<RefCell<Vec<(String, String)>>>,
        fail: Rc<Cell<bool>>,
    }

    impl MessageChannel for FakeChannel {
        fn send_image(&self, destination: &str, image: &[u8], caption: &str) -> Result<()> {
            if self.fail.get() {
                anyhow::bail!("simulated delivery failure");
            }
            self.sent_images.borrow_mut().push((
                destination.to_string(),
                image.to_vec(),
                caption.to_string(),
            ));
            Ok(())
        }

        fn send_text(&self, destination: &str, message: &str) -> Result<()> {
            if self.fail.get() {
                anyhow::bail!("simulated delivery failure");
            }
            self.sent_texts
                .borrow_mut()
                .push((destination.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn settings(enabled: bool) -> ChannelSettings {
        ChannelSettings {
            enabled,
            bot_token: "token".to_string(),
            chat_id: "chat".to_string(),
            cooldown: Duration::from_secs(30),
        }
    }

    fn detection() -> Detection {
        Detection {
            kind: DetectionKind::Fire,
            bbox: BoundingBox {
                x: 1,
                y: 1,
                width: 10,
                height: 20,
            },
            area: 180,
            aspect_ratio: 2.0,
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![40u8; 160 * 120 * 3], 160, 120, 1_000).unwrap()
    }

    fn dispatcher(
        high: ChannelSettings,
        low: ChannelSettings,
    ) -> (AlertDispatcher<FakeChannel>, FakeChannel, FakeChannel) {
        let hq = FakeChannel::default();
        let lq = FakeChannel::default();
        let dispatcher = AlertDispatcher::new(high.cooldown, low.cooldown)
            .with_channel(Quality::High, high, hq.clone())
            .with_channel(Quality::Low, low, lq.clone());
        (dispatcher, hq, lq)
    }

    #[test]
    fn successful_send_records_cooldown() {
        let (mut d, hq, lq) = dispatcher(settings(true), settings(true));
        assert_eq!(d.dispatch(&detection(), &frame(), 0), 2);
        assert_eq!(hq.sent_images.borrow().len(), 1);
        assert_eq!(lq.sent_images.borrow().len(), 1);

        // 10s later: both tiers still cooling.
        assert_eq!(d.dispatch(&detection(), &frame(), 10_000), 0);
        // 31s later: both ready again.
        assert_eq!(d.dispatch(&detection(), &frame(), 31_000), 2);
    }

    #[test]
    fn failed_send_leaves_throttle_ready() {
        let (mut d, hq, _lq) = dispatcher(settings(true), settings(false));
        hq.fail.set(true);
        assert_eq!(d.dispatch(&detection(), &frame(), 0), 0);

        // Retry one second later is still permitted.
        hq.fail.set(false);
        assert_eq!(d.dispatch(&detection(), &frame(), 1_000), 1);
    }

    #[test]
    fn cooldown_is_per_kind() {
        let (mut d, hq, _lq) = dispatcher(settings(true), settings(false));
        assert_eq!(d.dispatch(&detection(), &frame(), 0), 1);

        let mut person = detection();
        person.kind = DetectionKind::Person;
        assert_eq!(d.dispatch(&person, &frame(), 1_000), 1);
        assert_eq!(hq.sent_images.borrow().len(), 2);
    }

    #[test]
    fn disabled_or_credential_less_channels_are_skipped() {
        let mut no_creds = settings(true);
        no_creds.bot_token.clear();
        let (mut d, hq, lq) = dispatcher(settings(false), no_creds);
        assert_eq!(d.dispatch(&detection(), &frame(), 0), 0);
        assert!(hq.sent_images.borrow().is_empty());
        assert!(lq.sent_images.borrow().is_empty());
    }

    #[test]
    fn low_snapshot_is_half_resolution() {
        let bytes = render_snapshot(&frame(), Quality::Low).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));

        let bytes = render_snapshot(&frame(), Quality::High).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (160, 120));
    }

    #[test]
    fn caption_names_kind_area_and_timestamp() {
        let caption = alert_caption(&detection(), 99_000, Quality::High);
        assert!(caption.contains("fire"));
        assert!(caption.contains("180"));
        assert!(caption.contains("99000"));
        assert!(caption.contains("high"));
    }

    #[test]
    fn notices_bypass_the_throttle() {
        let (d, hq, _lq) = dispatcher(settings(true), settings(false));
        d.send_notice("monitoring started");
        d.send_notice("monitoring stopped");
        assert_eq!(hq.sent_texts.borrow().len(), 2);
    }
}
