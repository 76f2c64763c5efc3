//! Outbound Bot API calls.

use super::types::TgResponse;
use super::TelegramChannel;
use florence_core::error::FlorenceError;
use serde_json::json;
use tracing::warn;

impl TelegramChannel {
    /// Send a plain text message to a chat.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), FlorenceError> {
        let url = format!("{}/sendMessage", self.base_url);
        let resp: TgResponse<serde_json::Value> = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram sendMessage failed: {e}")))?
            .json()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram sendMessage parse failed: {e}")))?;

        if !resp.ok {
            return Err(FlorenceError::Channel(format!(
                "telegram sendMessage rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Register the command menu shown in the Telegram client. Failure is
    /// non-fatal; the bot still answers typed commands.
    pub(crate) async fn register_commands(&self) {
        let url = format!("{}/setMyCommands", self.base_url);
        let commands = json!({
            "commands": [
                {"command": "start", "description": "Restart the conversation"},
                {"command": "about", "description": "What Florence* can do"},
                {"command": "tokens", "description": "Check your token balance"},
                {"command": "streak", "description": "Check your learning streak"},
                {"command": "payments", "description": "Buy more tokens"},
                {"command": "help", "description": "List available commands"},
            ]
        });

        if let Err(e) = self.client.post(&url).json(&commands).send().await {
            warn!("telegram setMyCommands failed: {e}");
        }
    }
}
