//! Best-effort operator notifications through a Telegram bot.

use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use hookbridge_core::config::notifier::NotifierConfig;
use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_core::result::AppResult;

/// Longest text sent in one message.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Sends short status messages to an operator chat.
///
/// Delivery is never awaited by webhook processing: [`notify`] spawns the
/// request and failures are only logged.
///
/// [`notify`]: TelegramNotifier::notify
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    config: NotifierConfig,
    http: reqwest::Client,
}

impl TelegramNotifier {
    /// Build a notifier, or `None` when notifications are disabled or
    /// incompletely configured.
    pub fn from_config(config: &NotifierConfig) -> AppResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        if !config.is_usable() {
            debug!("Notifier enabled without bot token or chat id, skipping");
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("failed to build notifier HTTP client: {e}"),
                    e,
                )
            })?;
        Ok(Some(Self {
            config: config.clone(),
            http,
        }))
    }

    /// Deliver `text` and wait for the answer.
    pub async fn send(&self, text: &str) -> AppResult<()> {
        let url = send_message_url(&self.config, text)?;
        let response = self.http.get(url).send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("notifier request failed: {e}"),
                e,
            )
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "notifier answered {status}"
            )));
        }
        debug!(chat_id = %self.config.chat_id, "Notification delivered");
        Ok(())
    }

    /// Deliver `text` in the background.
    pub fn notify(&self, text: String) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&text).await {
                warn!(error = %e, "Operator notification failed");
            }
        });
    }
}

/// `{api_base}/bot{token}/sendMessage?chat_id=..&text=..`
fn send_message_url(config: &NotifierConfig, text: &str) -> AppResult<Url> {
    let base = format!(
        "{}/bot{}/sendMessage",
        config.api_base.trim_end_matches('/'),
        config.bot_token
    );
    let text = truncate(text, MAX_MESSAGE_CHARS);
    Url::parse_with_params(&base, &[("chat_id", config.chat_id.as_str()), ("text", text)])
        .map_err(|e| AppError::configuration(format!("invalid notifier URL: {e}")))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
