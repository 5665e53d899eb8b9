//! Alert throttling and dual-channel dispatch.
//!
//! Two independently configured notification channels exist, one per image
//! quality tier. Each (detection kind, tier) pair has its own cooldown so a
//! fire alert never starves a person alert, and the two tiers never block
//! each other.

pub mod dispatch;
pub mod telegram;
pub mod throttle;

use anyhow::Result;

pub use dispatch::{AlertDispatcher, ChannelSettings};
pub use telegram::TelegramChannel;
pub use throttle::AlertThrottle;

/// Snapshot quality tier; each tier is a separate channel with its own
/// credentials and cooldown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quality {
    High,
    Low,
}

impl Quality {
    pub fn label(&self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Low => "low",
        }
    }
}

/// Delivery seam for alert payloads.
///
/// Implementations send to an external service; failures are reported to the
/// dispatcher, which logs them and leaves the throttle untouched so the next
/// eligible frame retries.
pub trait MessageChannel {
    /// Deliver an encoded JPEG snapshot with a caption.
    fn send_image(&self, destination: &str, image: &[u8], caption: &str) -> Result<()>;

    /// Deliver a plain text message (startup/shutdown notices).
    fn send_text(&self, destination: &str, message: &str) -> Result<()>;
}
