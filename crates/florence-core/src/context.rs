use serde::{Deserialize, Serialize};

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Bounded rolling conversation history for one user.
///
/// Oldest turns are evicted first; order is never changed. The history is
/// never shared between users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed exchange (user turn then assistant turn), then
    /// truncate to the most recent `max_turns`.
    pub fn push_exchange(&mut self, user: &str, assistant: &str, max_turns: usize) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
        if self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            self.turns.drain(..excess);
        }
    }

    /// The most recent `max_turns` turns, oldest first — sent as prior
    /// context on a completion request.
    pub fn recent(&self, max_turns: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(max_turns);
        &self.turns[start..]
    }

    /// Reset to an empty sequence (the /start command).
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// An inline media part attached to a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPart {
    /// MIME type (e.g. "image/jpeg").
    pub media_type: String,
    /// Raw bytes, encoded by the provider as required.
    pub data: Vec<u8>,
}

/// A completion request passed to an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Prior conversation turns (oldest first).
    pub history: Vec<Turn>,
    /// The current user message.
    pub current_message: String,
    /// Inline media for multimodal requests.
    #[serde(default)]
    pub media: Vec<MediaPart>,
}

impl Context {
    /// Create a new context with just a current message and the default
    /// system prompt.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: default_system_prompt(),
            history: Vec::new(),
            current_message: message.to_string(),
            media: Vec::new(),
        }
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, turns)` — the system prompt is separated
    /// because the Anthropic API requires it outside the messages array.
    pub fn to_api_messages(&self) -> (String, Vec<Turn>) {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(Turn::user(self.current_message.clone()));
        (self.system_prompt.clone(), messages)
    }
}

/// Default system prompt for Florence.
pub fn default_system_prompt() -> String {
    "You are a highly knowledgeable teacher on every subject. Your name is Florence*."
        .to_string()
}
