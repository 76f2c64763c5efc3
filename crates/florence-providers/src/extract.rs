//! Document-to-text extraction.

use async_trait::async_trait;
use florence_core::{error::FlorenceError, traits::DocumentExtractor};

/// Extracts text from plain UTF-8 documents (txt, csv, receipts exported
/// as text). Binary formats are rejected rather than guessed at.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text(&self, document: &[u8]) -> Result<String, FlorenceError> {
        let text = std::str::from_utf8(document).map_err(|_| {
            FlorenceError::Extraction("document is not valid UTF-8 text".to_string())
        })?;
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_utf8_text() {
        let extractor = PlainTextExtractor::new();
        let text = extractor
            .extract_text("Payment of 1000 via Flutterwave on 02/06/2025".as_bytes())
            .await
            .unwrap();
        assert!(text.contains("Flutterwave"));
    }

    #[tokio::test]
    async fn test_rejects_binary_documents() {
        let extractor = PlainTextExtractor::new();
        let result = extractor.extract_text(&[0xFF, 0xFE, 0x00, 0x80]).await;
        assert!(result.is_err());
    }
}
