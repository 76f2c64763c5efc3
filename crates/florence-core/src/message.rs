use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of an inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Document,
    /// Anything the gateway cannot price (stickers, contacts, locations...).
    Other,
}

/// An incoming event from a channel, normalized across platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific user ID — the store key.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// What kind of content this is.
    pub content: ContentKind,
    /// Message text (or caption for media).
    pub text: String,
    /// Media references; resolved to bytes via the channel on demand.
    pub attachments: Vec<AttachmentRef>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub metadata: MessageMetadata,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
}

/// Metadata about how a response was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    /// Which provider produced this response.
    pub provider_used: String,
    /// Model identifier (if applicable).
    pub model: Option<String>,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// A reference to a media item held by the platform.
///
/// Channels resolve these to raw bytes with `Channel::fetch_attachment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Platform file handle (e.g. Telegram file_id).
    pub id: String,
    /// MIME type if the platform reported one.
    pub mime_type: Option<String>,
    pub filename: Option<String>,
}

impl IncomingMessage {
    /// Convenience constructor for events that carry only text.
    pub fn text(channel: &str, sender_id: &str, text: &str) -> Self {
        Self {
            channel: channel.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: None,
            content: ContentKind::Text,
            text: text.to_string(),
            attachments: Vec::new(),
            reply_target: None,
            timestamp: Utc::now(),
        }
    }
}
