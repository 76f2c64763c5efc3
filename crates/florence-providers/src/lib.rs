//! # florence-providers
//!
//! LLM provider implementations and document-to-text extraction for
//! Florence.

pub mod anthropic;
pub mod extract;

pub use anthropic::AnthropicProvider;
pub use extract::PlainTextExtractor;

use florence_core::{config::ProviderConfig, error::FlorenceError, traits::Provider};
use std::sync::Arc;

/// Build the configured provider.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>, FlorenceError> {
    match config.default.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::from_config(&config.anthropic))),
        other => Err(FlorenceError::Config(format!(
            "unknown provider '{other}'"
        ))),
    }
}
