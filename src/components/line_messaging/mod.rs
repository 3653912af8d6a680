use crate::components::Messenger;
use crate::error::{messaging_error, BotResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

/// LINE Messaging API client for push messages
#[derive(Clone)]
pub struct LineClient {
    channel_access_token: String,
    client: Client,
}

impl LineClient {
    pub fn new(channel_access_token: String) -> Self {
        Self {
            channel_access_token,
            client: Client::new(),
        }
    }
}

/// Push request carrying a single text message
pub fn push_body(target_id: &str, text: &str) -> Value {
    json!({
        "to": target_id,
        "messages": [{ "type": "text", "text": text }]
    })
}

#[async_trait]
impl Messenger for LineClient {
    async fn send_message(&self, target_id: &str, text: &str) -> BotResult<()> {
        let response = self
            .client
            .post(PUSH_URL)
            .bearer_auth(&self.channel_access_token)
            .json(&push_body(target_id, text))
            .send()
            .await
            .map_err(|e| messaging_error(&format!("Failed to push message: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(messaging_error(&format!(
                "Failed to push message: HTTP {} - {}",
                status, error_body
            )));
        }

        Ok(())
    }
}
