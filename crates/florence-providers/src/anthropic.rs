//! Anthropic API provider.
//!
//! Calls the Anthropic Messages API directly. Inline media on the current
//! message is sent as base64 image blocks alongside the text.

use async_trait::async_trait;
use base64::Engine;
use florence_core::{
    config::AnthropicConfig,
    context::Context,
    error::FlorenceError,
    message::{MessageMetadata, OutgoingMessage},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create from config values. An empty configured key falls back to
    /// the ANTHROPIC_API_KEY environment variable.
    pub fn from_config(config: &AnthropicConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("ANTHROPIC_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: MessageContent,
}

/// Plain text for history turns, block array when media is attached.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: String,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicContentBlock>>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

fn build_messages(context: &Context) -> Vec<AnthropicMessage> {
    let (_, api_messages) = context.to_api_messages();
    let last = api_messages.len() - 1;

    api_messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            // Media rides on the current (final) user turn only.
            let content = if i == last && !context.media.is_empty() {
                let mut blocks: Vec<ContentBlock> = context
                    .media
                    .iter()
                    .map(|part| ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64".to_string(),
                            media_type: part.media_type.clone(),
                            data: base64::engine::general_purpose::STANDARD.encode(&part.data),
                        },
                    })
                    .collect();
                blocks.push(ContentBlock::Text { text: m.content });
                MessageContent::Blocks(blocks)
            } else {
                MessageContent::Text(m.content)
            };
            AnthropicMessage {
                role: m.role,
                content,
            }
        })
        .collect()
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, FlorenceError> {
        let (system, _) = context.to_api_messages();
        let start = Instant::now();

        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages: build_messages(context),
        };

        debug!("anthropic: POST {ANTHROPIC_API_URL} model={}", self.model);

        let resp = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FlorenceError::Provider(format!("anthropic request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FlorenceError::Provider(format!(
                "anthropic returned {status}: {text}"
            )));
        }

        let parsed: AnthropicResponse = resp.json().await.map_err(|e| {
            FlorenceError::Provider(format!("anthropic: failed to parse response: {e}"))
        })?;

        let text = parsed
            .content
            .as_ref()
            .and_then(|blocks| blocks.first())
            .map(|b| b.text.clone())
            .unwrap_or_else(|| "No response from Anthropic.".to_string());

        let elapsed_ms = start.elapsed().as_millis() as u64;

        Ok(OutgoingMessage {
            text,
            metadata: MessageMetadata {
                provider_used: "anthropic".to_string(),
                model: parsed.model,
                processing_time_ms: elapsed_ms,
            },
            reply_target: None,
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("anthropic: no API key configured");
            return false;
        }
        // No lightweight health endpoint; we trust the key is valid.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use florence_core::context::{MediaPart, Turn};

    #[test]
    fn test_provider_name() {
        let p = AnthropicProvider::from_config(&AnthropicConfig {
            api_key: "sk-ant-test".into(),
            model: "claude-3-5-sonnet-20241022".into(),
            max_tokens: 1024,
        });
        assert_eq!(p.name(), "anthropic");
    }

    #[test]
    fn test_request_serialization() {
        let body = AnthropicRequest {
            model: "claude-3-5-sonnet-20241022".into(),
            max_tokens: 1024,
            system: "Be helpful.".into(),
            messages: vec![AnthropicMessage {
                role: "user".into(),
                content: MessageContent::Text("Hello".into()),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["system"], "Be helpful.");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_empty_system_omitted() {
        let body = AnthropicRequest {
            model: "claude-3-5-sonnet-20241022".into(),
            max_tokens: 1024,
            system: String::new(),
            messages: vec![],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_media_becomes_image_blocks_on_final_turn() {
        let mut ctx = Context::new("What is in this picture?");
        ctx.history = vec![Turn::user("Hi"), Turn::assistant("Hello!")];
        ctx.media = vec![MediaPart {
            media_type: "image/jpeg".into(),
            data: vec![0xFF, 0xD8, 0xFF],
        }];

        let messages = build_messages(&ctx);
        let json = serde_json::to_value(&messages).unwrap();

        // History turns stay plain strings.
        assert_eq!(json[0]["content"], "Hi");
        assert_eq!(json[1]["content"], "Hello!");

        // Final turn carries the image then the text.
        let blocks = &json[2]["content"];
        assert_eq!(blocks[0]["type"], "image");
        assert_eq!(blocks[0]["source"]["type"], "base64");
        assert_eq!(blocks[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(blocks[0]["source"]["data"], "/9j/");
        assert_eq!(blocks[1]["type"], "text");
        assert_eq!(blocks[1]["text"], "What is in this picture?");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"content":[{"type":"text","text":"Hello!"}],"model":"claude-3-5-sonnet-20241022","usage":{"input_tokens":10,"output_tokens":5}}"#;
        let resp: AnthropicResponse = serde_json::from_str(json).unwrap();
        let text = resp
            .content
            .as_ref()
            .and_then(|b| b.first())
            .map(|b| b.text.clone());
        assert_eq!(text, Some("Hello!".into()));
        assert_eq!(resp.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
    }
}
