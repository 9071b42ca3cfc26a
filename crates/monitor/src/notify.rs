use async_trait::async_trait;
use tracing::{debug, info, warn};

use common::Notifier;

/// Telegram alert channel for trade confirmations and failures.
///
/// Alerting is strictly best-effort: a dead network or a revoked token
/// must never affect trading, so every failure is logged and dropped.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            chat_id,
        }
    }

    /// Build from `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID`. Returns `None`
    /// when either is unset, in which case alerting is simply disabled.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("TELEGRAM_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        info!("Telegram alerts enabled");
        Some(Self::new(token, chat_id))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
        });
        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Telegram alert sent");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Telegram alert rejected");
            }
            Err(e) => {
                warn!(error = %e, "Telegram alert failed");
            }
        }
    }
}

/// No-op notifier used when alerting is not configured and in backtests.
#[derive(Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _message: &str) {}
}
