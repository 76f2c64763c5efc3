//! Long-polling update loop and Channel trait implementation.

use super::types::{TgFile, TgMessage, TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use florence_core::{
    error::FlorenceError,
    message::{AttachmentRef, ContentKind, IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Normalize a Telegram message into a gateway event. Returns None for
/// service messages, group chats, and messages without a sender.
pub(crate) fn map_message(msg: TgMessage) -> Option<IncomingMessage> {
    let user = msg.from?;

    // Person-to-person only.
    if matches!(msg.chat.chat_type.as_str(), "group" | "supergroup" | "channel") {
        debug!("telegram: ignoring group message from chat {}", msg.chat.id);
        return None;
    }

    let (content, text, attachments) = if let Some(t) = msg.text {
        (ContentKind::Text, t, Vec::new())
    } else if let Some(photos) = msg.photo {
        // Telegram sends multiple sizes; the last is the largest.
        let largest = photos.last()?;
        let attachment = AttachmentRef {
            id: largest.file_id.clone(),
            mime_type: Some("image/jpeg".to_string()),
            filename: None,
        };
        (
            ContentKind::Image,
            msg.caption.unwrap_or_default(),
            vec![attachment],
        )
    } else if let Some(doc) = msg.document {
        let attachment = AttachmentRef {
            id: doc.file_id,
            mime_type: doc.mime_type,
            filename: doc.file_name,
        };
        (
            ContentKind::Document,
            msg.caption.unwrap_or_default(),
            vec![attachment],
        )
    } else if msg.sticker.is_some()
        || msg.voice.is_some()
        || msg.video.is_some()
        || msg.contact.is_some()
        || msg.location.is_some()
    {
        (ContentKind::Other, String::new(), Vec::new())
    } else {
        // Service message (member joined, pinned, ...).
        return None;
    };

    let sender_name = match user.last_name {
        Some(ref ln) => format!("{} {ln}", user.first_name),
        None => user.first_name.clone(),
    };

    Some(IncomingMessage {
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(sender_name),
        content,
        text,
        attachments,
        reply_target: Some(msg.chat.id.to_string()),
        timestamp: chrono::Utc::now(),
    })
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, FlorenceError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(msg) = update.message else { continue };
                    let Some(incoming) = map_message(msg) else { continue };

                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), FlorenceError> {
        let chat_id_str = message
            .reply_target
            .as_deref()
            .ok_or_else(|| FlorenceError::Channel("no reply_target on outgoing message".into()))?;

        let chat_id: i64 = chat_id_str.parse().map_err(|e| {
            FlorenceError::Channel(format!("invalid telegram chat_id '{chat_id_str}': {e}"))
        })?;

        self.send_text(chat_id, &message.text).await
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>, FlorenceError> {
        // Step 1: getFile to obtain file_path.
        let url = format!("{}/getFile?file_id={}", self.base_url, attachment.id);
        let resp: TgResponse<TgFile> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram getFile failed: {e}")))?
            .json()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram getFile parse failed: {e}")))?;

        let file_path = resp
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| FlorenceError::Channel("telegram getFile returned no file_path".into()))?;

        // Step 2: Download the actual file bytes.
        let download_url = format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.config.bot_token
        );
        let bytes = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram file download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| FlorenceError::Channel(format!("telegram file read failed: {e}")))?;

        Ok(bytes.to_vec())
    }

    async fn stop(&self) -> Result<(), FlorenceError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}
