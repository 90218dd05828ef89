//! Outbound notification channel, fire-and-forget.
//!
//! Delivery failures are logged and swallowed: a dead notifier must never
//! stall the settlement pipeline.

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}

/// Telegram Bot API client.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let result = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "disable_web_page_preview": true,
            }))
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!("telegram rejected notification: {}", response.status());
            }
            Err(e) => warn!("telegram notification failed: {e}"),
            _ => {}
        }
    }
}

/// Notifier used when no channel is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _text: &str) {}
}
