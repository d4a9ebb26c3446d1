//! Operator chat notifier configuration.

use serde::{Deserialize, Serialize};

/// Telegram bot side channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Whether status messages are sent at all.
    #[serde(default)]
    pub enabled: bool,
    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot token.
    #[serde(default, skip_serializing)]
    pub bot_token: String,
    /// Target chat id.
    #[serde(default)]
    pub chat_id: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Also report received payloads and successful deliveries.
    #[serde(default)]
    pub notify_on_success: bool,
}

impl NotifierConfig {
    /// Enabled and carrying both a token and a chat id.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_seconds: default_timeout(),
            notify_on_success: false,
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    5
}
