//! TOML configuration for the infrastructure wiring.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use huddle_core::error::{HuddleError, Result};

/// Top-level configuration, loaded from a TOML file. Every field has a
/// default so a partial (or missing) file still yields a usable config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HuddleConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; empty disables the sink.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default = "default_sink_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,
    #[serde(default = "default_message_history_limit")]
    pub message_history_limit: usize,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_ai_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_sink_timeout_secs() -> u64 {
    5
}

fn default_ai_timeout_secs() -> u64 {
    10
}

fn default_message_history_limit() -> usize {
    100
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_telegram_api_base(),
            timeout_secs: default_sink_timeout_secs(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sink_timeout_secs: default_sink_timeout_secs(),
            message_history_limit: default_message_history_limit(),
        }
    }
}

impl HuddleConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HuddleError::Config(format!("read config: {e}")))?;
        toml::from_str(&raw).map_err(|e| HuddleError::Config(format!("parse config: {e}")))
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_secs)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.notify.sink_timeout_secs)
    }
}
