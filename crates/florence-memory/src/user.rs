use chrono::{DateTime, Utc};
use florence_core::context::Conversation;
use serde::{Deserialize, Serialize};

/// One record per external chat identity.
///
/// Created on the first-ever inbound event and mutated on every
/// subsequent one; never deleted. `tokens` never goes negative — charges
/// that would overdraw are refused before any mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Platform-specific identifier, immutable, unique key.
    pub sender_id: String,
    /// Informational, mutable.
    pub display_name: String,
    /// Balance, always >= 0.
    pub tokens: i64,
    /// Consecutive-day activity counter.
    pub streak_count: u32,
    /// Last calendar date the streak was incremented.
    pub streak_date: DateTime<Utc>,
    /// Last time the user sent charged content (commands excluded).
    pub last_activity_at: DateTime<Utc>,
    /// When the periodic grant was last evaluated and applied.
    pub last_grant_at: DateTime<Utc>,
    /// Bounded rolling conversation history.
    pub history: Conversation,
    /// Set when /payments armed the proof flow; cleared on success.
    pub pending_payment_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A brand-new record: seeded balance, zero streak, all time fields
    /// stamped with the creation instant, empty history.
    pub fn new(sender_id: &str, display_name: &str, starting_tokens: i64, now: DateTime<Utc>) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            display_name: display_name.to_string(),
            tokens: starting_tokens,
            streak_count: 0,
            streak_date: now,
            last_activity_at: now,
            last_grant_at: now,
            history: Conversation::new(),
            pending_payment_at: None,
            created_at: now,
        }
    }

    /// First name only, for informal replies.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.display_name)
    }
}
