//! Telegram bot sink.
//!
//! Delivers formatted notifications through the Bot API `sendMessage`
//! endpoint. Each delivery is independent; callers apply their own timeout
//! on top of the client's.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use huddle_core::error::{HuddleError, Result};
use huddle_core::notify::BotSink;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramBotSink {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramBotSink {
    pub fn new(token: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE, request_timeout)
    }

    /// Overridable API base for tests and self-hosted bot gateways.
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HuddleError::external_sink("telegram", e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: api_base.into(),
        })
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl BotSink for TelegramBotSink {
    async fn deliver(&self, contact_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.send_url())
            .json(&json!({
                "chat_id": contact_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| HuddleError::external_sink("telegram", e.to_string()))?;

        if !response.status().is_success() {
            return Err(HuddleError::external_sink(
                "telegram",
                format!("sendMessage returned {}", response.status()),
            ));
        }
        debug!(contact = contact_id, "telegram notification delivered");
        Ok(())
    }
}
