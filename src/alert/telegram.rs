//! Telegram Bot API channel.
//!
//! Snapshots go out as `sendPhoto` multipart/form-data uploads, notices as
//! `sendMessage` JSON. The bot token is part of the request path, so error
//! contexts deliberately avoid echoing URLs.

use anyhow::{anyhow, Context, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

use crate::alert::MessageChannel;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(20);

pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    agent: ureq::Agent,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> Result<Self> {
        Self::with_api_base(bot_token, DEFAULT_API_BASE)
    }

    /// Point the channel at a different API host (tests, proxies).
    pub fn with_api_base(bot_token: &str, api_base: &str) -> Result<Self> {
        if bot_token.trim().is_empty() {
            return Err(anyhow!("telegram bot token is empty"));
        }
        Url::parse(api_base).context("parse telegram api base url")?;
        let agent = ureq::AgentBuilder::new()
            .timeout(SEND_TIMEOUT)
            .build();
        Ok(Self {
            bot_token: bot_token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            agent,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

impl MessageChannel for TelegramChannel {
    fn send_image(&self, destination: &str, image: &[u8], caption: &str) -> Result<()> {
        let boundary = fresh_boundary();
        let body = multipart_photo(destination, caption, image, &boundary);
        self.agent
            .post(&self.method_url("sendPhoto"))
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .send_bytes(&body)
            .map_err(scrub_error)
            .context("telegram sendPhoto")?;
        Ok(())
    }

    fn send_text(&self, destination: &str, message: &str) -> Result<()> {
        self.agent
            .post(&self.method_url("sendMessage"))
            .send_json(serde_json::json!({
                "chat_id": destination,
                "text": message,
            }))
            .map_err(scrub_error)
            .context("telegram sendMessage")?;
        Ok(())
    }
}

/// Collapse transport errors to their display form so the token-bearing URL
/// inside `ureq::Error` never reaches the logs.
fn scrub_error(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, _) => anyhow!("api returned status {}", code),
        ureq::Error::Transport(_) => anyhow!("transport error"),
    }
}

fn fresh_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("heatwatch-{:032x}", nanos)
}

/// Build a multipart/form-data body with chat_id, caption and photo parts.
fn multipart_photo(chat_id: &str, caption: &str, jpeg: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(jpeg.len() + 512);
    let mut push = |s: &str| body.extend_from_slice(s.as_bytes());

    push(&format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"chat_id\"\r\n\r\n{chat_id}\r\n",
        b = boundary
    ));
    push(&format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\n{caption}\r\n",
        b = boundary
    ));
    push(&format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"snapshot.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
        b = boundary
    ));
    body.extend_from_slice(jpeg);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_token() {
        assert!(TelegramChannel::new("").is_err());
        assert!(TelegramChannel::new("  ").is_err());
    }

    #[test]
    fn method_urls_embed_token_and_method() {
        let channel = TelegramChannel::with_api_base("123:abc", "http://localhost:9999/").unwrap();
        assert_eq!(
            channel.method_url("sendPhoto"),
            "http://localhost:9999/bot123:abc/sendPhoto"
        );
    }

    #[test]
    fn multipart_body_carries_all_parts() {
        let body = multipart_photo("42", "fire detected", b"\xff\xd8jpeg", "XYZ");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("--XYZ\r\n"));
        assert!(text.contains("name=\"chat_id\"\r\n\r\n42\r\n"));
        assert!(text.contains("name=\"caption\"\r\n\r\nfire detected\r\n"));
        assert!(text.contains("filename=\"snapshot.jpg\""));
        assert!(text.contains("Content-Type: image/jpeg"));
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
        // Raw jpeg bytes are present verbatim.
        assert!(body.windows(6).any(|w| w == b"\xff\xd8jpeg"));
    }
}
