//! Per (detection kind, quality tier) alert cooldown.
//!
//! `permit` is a read-only check and never transitions state; `record_sent`
//! must be called only after a delivery actually succeeded, so a failed send
//! leaves the pair ready and the next eligible frame retries immediately
//! instead of waiting out a cooldown for a message that never arrived.
//!
//! The throttle is owned by a single dispatcher and `record_sent` takes
//! `&mut self`, so a permit/record pair can never interleave with another
//! caller's check-then-set.

use std::collections::HashMap;
use std::time::Duration;

use crate::alert::Quality;
use crate::detect::DetectionKind;

pub struct AlertThrottle {
    cooldown_ms: HashMap<Quality, u64>,
    last_sent_ms: HashMap<(DetectionKind, Quality), u64>,
}

impl AlertThrottle {
    pub fn new(high_cooldown: Duration, low_cooldown: Duration) -> Self {
        let mut cooldown_ms = HashMap::new();
        cooldown_ms.insert(Quality::High, high_cooldown.as_millis() as u64);
        cooldown_ms.insert(Quality::Low, low_cooldown.as_millis() as u64);
        Self {
            cooldown_ms,
            last_sent_ms: HashMap::new(),
        }
    }

    /// True when the pair has never sent, or its cooldown has elapsed.
    pub fn permit(&self, kind: DetectionKind, quality: Quality, now_ms: u64) -> bool {
        let cooldown = self.cooldown_ms.get(&quality).copied().unwrap_or(0);
        match self.last_sent_ms.get(&(kind, quality)) {
            Some(&last) => now_ms.saturating_sub(last) >= cooldown,
            None => true,
        }
    }

    /// Record a successful delivery for the pair.
    pub fn record_sent(&mut self, kind: DetectionKind, quality: Quality, now_ms: u64) {
        self.last_sent_ms.insert((kind, quality), now_ms);
    }
}
