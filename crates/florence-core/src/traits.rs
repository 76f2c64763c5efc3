use crate::{
    context::Context,
    error::FlorenceError,
    message::{AttachmentRef, IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// LLM completion capability — the brain.
///
/// Every AI backend implements this trait to provide a uniform interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a conversation context to the provider and get a response.
    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, FlorenceError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging channel capability — the nervous system.
///
/// Every messaging platform implements this trait to receive and send
/// messages and to resolve media references to raw bytes.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, FlorenceError>;

    /// Send a response back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), FlorenceError>;

    /// Resolve a media reference to raw bytes.
    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>, FlorenceError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), FlorenceError>;
}

/// Document-to-text extraction capability, used for payment proofs.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, document: &[u8]) -> Result<String, FlorenceError>;
}

/// Supplies the current time. Injected so temporal rules are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
