//! Daemon configuration.
//!
//! Loaded once at startup: JSON file named by `HEATWATCH_CONFIG`, then
//! environment overrides, then validation. Every section is optional in the
//! file; missing values take the defaults tuned for a 160x120 thermal camera
//! on a single-board computer.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_DEVICE: &str = "stub://thermal";
const DEFAULT_WIDTH: u32 = 160;
const DEFAULT_HEIGHT: u32 = 120;
const DEFAULT_FPS: u32 = 10;
const DEFAULT_MAX_EMPTY_READS: u32 = 50;
const DEFAULT_MIN_AREA: u32 = 50;
const DEFAULT_MAX_AREA: u32 = 30000;
const DEFAULT_PERSON_PERCENTILE: f64 = 30.0;
const DEFAULT_FIRE_THRESHOLD: u8 = 255;
const DEFAULT_PROCESS_EVERY: u64 = 2;
const DEFAULT_RECORDING_DIR: &str = "videos";
const DEFAULT_RETENTION_DAYS: u64 = 3;
const DEFAULT_COOLDOWN_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    capture: Option<CaptureFile>,
    detection: Option<DetectionFile>,
    recording: Option<RecordingFile>,
    channels: Option<ChannelsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
    max_empty_reads: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionFile {
    min_area: Option<u32>,
    max_area: Option<u32>,
    person_percentile: Option<f64>,
    fire_threshold: Option<u8>,
    process_every: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RecordingFile {
    dir: Option<String>,
    retention_days: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ChannelsFile {
    high: Option<ChannelFile>,
    low: Option<ChannelFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ChannelFile {
    enabled: Option<bool>,
    bot_token: Option<String>,
    chat_id: Option<String>,
    cooldown_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HeatwatchConfig {
    pub capture: CaptureSettings,
    pub detection: DetectionSettings,
    pub recording: RecordingSettings,
    pub channels: ChannelsSettings,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Consecutive empty reads tolerated before the daemon gives up.
    pub max_empty_reads: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub min_area: u32,
    pub max_area: u32,
    pub person_percentile: f64,
    pub fire_threshold: u8,
    pub process_every: u64,
}

#[derive(Debug, Clone)]
pub struct RecordingSettings {
    pub dir: String,
    pub retention_days: u64,
}

#[derive(Debug, Clone)]
pub struct ChannelsSettings {
    pub high: ChannelSetting,
    pub low: ChannelSetting,
}

#[derive(Debug, Clone)]
pub struct ChannelSetting {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub cooldown: Duration,
}

impl HeatwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("HEATWATCH_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let capture = file.capture.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let recording = file.recording.unwrap_or_default();
        let channels = file.channels.unwrap_or_default();

        Self {
            capture: CaptureSettings {
                device: capture.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                width: capture.width.unwrap_or(DEFAULT_WIDTH),
                height: capture.height.unwrap_or(DEFAULT_HEIGHT),
                fps: capture.fps.unwrap_or(DEFAULT_FPS),
                max_empty_reads: capture.max_empty_reads.unwrap_or(DEFAULT_MAX_EMPTY_READS),
            },
            detection: DetectionSettings {
                min_area: detection.min_area.unwrap_or(DEFAULT_MIN_AREA),
                max_area: detection.max_area.unwrap_or(DEFAULT_MAX_AREA),
                person_percentile: detection
                    .person_percentile
                    .unwrap_or(DEFAULT_PERSON_PERCENTILE),
                fire_threshold: detection.fire_threshold.unwrap_or(DEFAULT_FIRE_THRESHOLD),
                process_every: detection.process_every.unwrap_or(DEFAULT_PROCESS_EVERY),
            },
            recording: RecordingSettings {
                dir: recording
                    .dir
                    .unwrap_or_else(|| DEFAULT_RECORDING_DIR.to_string()),
                retention_days: recording.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
            },
            channels: ChannelsSettings {
                high: channel_from_file(channels.high.unwrap_or_default()),
                low: channel_from_file(channels.low.unwrap_or_default()),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("HEATWATCH_DEVICE") {
            if !device.trim().is_empty() {
                self.capture.device = device;
            }
        }
        if let Ok(dir) = std::env::var("HEATWATCH_RECORDING_DIR") {
            if !dir.trim().is_empty() {
                self.recording.dir = dir;
            }
        }
        if let Ok(days) = std::env::var("HEATWATCH_RETENTION_DAYS") {
            let days: u64 = days
                .parse()
                .map_err(|_| anyhow!("HEATWATCH_RETENTION_DAYS must be an integer"))?;
            self.recording.retention_days = days;
        }
        apply_channel_env(&mut self.channels.high, "HQ")?;
        apply_channel_env(&mut self.channels.low, "LQ")?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!("capture dimensions must be non-zero"));
        }
        if self.capture.fps == 0 {
            return Err(anyhow!("capture fps must be non-zero"));
        }
        if self.detection.process_every == 0 {
            return Err(anyhow!("detection.process_every must be at least 1"));
        }
        if self.detection.min_area > self.detection.max_area {
            return Err(anyhow!(
                "detection.min_area ({}) exceeds max_area ({})",
                self.detection.min_area,
                self.detection.max_area
            ));
        }
        for (name, channel) in [("high", &self.channels.high), ("low", &self.channels.low)] {
            if channel.cooldown.is_zero() {
                return Err(anyhow!("channels.{}.cooldown_seconds must be non-zero", name));
            }
        }
        Ok(())
    }
}

fn channel_from_file(file: ChannelFile) -> ChannelSetting {
    ChannelSetting {
        enabled: file.enabled.unwrap_or(false),
        bot_token: file.bot_token.unwrap_or_default(),
        chat_id: file.chat_id.unwrap_or_default(),
        cooldown: Duration::from_secs(file.cooldown_seconds.unwrap_or(DEFAULT_COOLDOWN_SECS)),
    }
}

fn apply_channel_env(channel: &mut ChannelSetting, suffix: &str) -> Result<()> {
    if let Ok(token) = std::env::var(format!("HEATWATCH_BOT_TOKEN_{}", suffix)) {
        if !token.trim().is_empty() {
            channel.bot_token = token;
        }
    }
    if let Ok(chat) = std::env::var(format!("HEATWATCH_CHAT_ID_{}", suffix)) {
        if !chat.trim().is_empty() {
            channel.chat_id = chat;
        }
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
