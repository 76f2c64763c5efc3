use thiserror::Error;

/// Top-level error type for Florence.
///
/// Expected policy outcomes (insufficient tokens, too many attachments,
/// unsupported content) are NOT errors — they live in `florence-economy`
/// and are surfaced as user-facing replies.
#[derive(Debug, Error)]
pub enum FlorenceError {
    /// Error from the LLM completion provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// User store error.
    #[error("store error: {0}")]
    Store(String),

    /// Document text extraction error.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
