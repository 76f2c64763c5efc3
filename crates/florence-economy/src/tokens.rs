//! Periodic token grants and per-content charges.

use chrono::{DateTime, Utc};
use florence_core::{config::EconomyConfig, message::ContentKind};

/// Why a charge was refused. These are expected outcomes, not failures;
/// the gateway turns each into a distinct user-facing reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeRefusal {
    /// Balance is below the price of this content.
    InsufficientTokens,
    /// More media items than the configured limit.
    TooManyAttachments,
    /// Content the gateway cannot price (stickers, locations...).
    UnsupportedContent,
}

/// Token grant and charge rules.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    config: EconomyConfig,
}

impl TokenPolicy {
    pub fn new(config: EconomyConfig) -> Self {
        Self { config }
    }

    /// Evaluate the periodic activity grant.
    ///
    /// Applies only at or below the low-balance threshold. Grants one
    /// bundle per full interval elapsed since the last grant evaluation;
    /// the caller stamps `last_grant_at = now` when the result is > 0.
    pub fn periodic_grant(
        &self,
        now: DateTime<Utc>,
        tokens: i64,
        last_grant_at: DateTime<Utc>,
    ) -> i64 {
        if tokens > self.config.low_balance_threshold {
            return 0;
        }
        let hours_since = (now - last_grant_at).num_hours();
        if hours_since < self.config.grant_interval_hours {
            return 0;
        }
        (hours_since / self.config.grant_interval_hours) * self.config.grant_amount
    }

    /// Price of one inbound content item. `None` means the content type
    /// cannot be charged at all.
    pub fn charge_for(&self, kind: ContentKind) -> Option<i64> {
        match kind {
            ContentKind::Text => Some(1),
            ContentKind::Image | ContentKind::Document => Some(2),
            ContentKind::Other => None,
        }
    }

    /// Decide the charge for an inbound message, or refuse it.
    ///
    /// The attachment-count guard runs before any pricing, so an
    /// over-limit message never touches the balance. The returned charge
    /// is guaranteed to be coverable by `balance`.
    pub fn evaluate_charge(
        &self,
        kind: ContentKind,
        attachment_count: usize,
        balance: i64,
    ) -> Result<i64, ChargeRefusal> {
        if attachment_count > self.config.max_attachments {
            return Err(ChargeRefusal::TooManyAttachments);
        }
        let charge = self
            .charge_for(kind)
            .ok_or(ChargeRefusal::UnsupportedContent)?;
        if balance < charge {
            return Err(ChargeRefusal::InsufficientTokens);
        }
        Ok(charge)
    }

    /// The configured low-balance threshold (used for /tokens nudges).
    pub fn low_balance_threshold(&self) -> i64 {
        self.config.low_balance_threshold
    }
}
