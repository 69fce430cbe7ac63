//! Telegram Bot writer: sends via Bot API `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::config::TelegramConfig;
use bazaar_core::{BazaarError, MessageWriter, Result};
use serde::Deserialize;

/// Telegram writer. The address is a chat id or an `@channel` handle.
#[derive(Clone)]
pub struct TelegramWriter {
    client: reqwest::Client,
    bot_token: String,
    api_base: String,
}

impl TelegramWriter {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(BazaarError::Config("telegram bot_token is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BazaarError::Channel(format!("Telegram client: {e}")))?;
        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn check_chat_id(chat_id: &str) -> Result<()> {
        if chat_id.trim().is_empty() {
            return Err(BazaarError::Channel("empty telegram chat id".into()));
        }
        Ok(())
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        Self::check_chat_id(chat_id)?;
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BazaarError::Channel(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse = response
            .json()
            .await
            .map_err(|e| BazaarError::Channel(format!("Invalid send response: {e}")))?;

        if !result.ok {
            return Err(BazaarError::Channel(format!(
                "Send failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        tracing::debug!("Telegram message sent to {chat_id}");
        Ok(())
    }
}

#[async_trait]
impl MessageWriter for TelegramWriter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_now(&self, text: &str, address: &str) -> Result<()> {
        self.send_message(address, text).await
    }

    async fn send_later(&self, text: &str, address: &str, eta: Duration) -> Result<()> {
        Self::check_chat_id(address)?;
        let writer = self.clone();
        let chat_id = address.to_string();
        let text = text.to_string();
        crate::deliver_after("telegram", chat_id.clone(), eta, async move {
            writer.send_message(&chat_id, &text).await
        });
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    ok: bool,
    description: Option<String>,
}
