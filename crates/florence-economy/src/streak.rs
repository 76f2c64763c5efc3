//! Daily streak state machine.

use chrono::{DateTime, Utc};
use florence_core::config::EconomyConfig;

/// A streak is considered broken after this much inactivity.
const BREAK_AFTER_HOURS: i64 = 48;

/// Result of one streak evaluation. Exactly one transition fires per
/// qualifying message; `Broken` is checked first, so it and `Advanced`
/// are mutually exclusive within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// More than 48h of inactivity: count resets to zero, no reward.
    Broken,
    /// A new calendar day: the incremented count, plus the milestone
    /// bonus when the new count is a positive multiple of the interval
    /// (0 otherwise).
    Advanced { count: u32, reward: i64 },
    /// Same calendar day, within the window: nothing changes.
    Unchanged,
}

/// Streak increment, reset, and milestone rules.
///
/// Calendar days are compared in UTC; "a new day" means the UTC date of
/// `now` differs from the UTC date of the stored streak date, regardless
/// of exact elapsed hours.
#[derive(Debug, Clone)]
pub struct StreakPolicy {
    config: EconomyConfig,
}

impl StreakPolicy {
    pub fn new(config: EconomyConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        streak_count: u32,
        streak_date: DateTime<Utc>,
        last_activity_at: DateTime<Utc>,
    ) -> StreakOutcome {
        if (now - last_activity_at).num_hours() > BREAK_AFTER_HOURS {
            return StreakOutcome::Broken;
        }

        if now.date_naive() != streak_date.date_naive() {
            let count = streak_count + 1;
            // interval 0 disables milestones rather than dividing by zero.
            let interval = self.config.milestone_interval;
            let reward = if interval > 0 && count % interval == 0 {
                self.config.milestone_reward
            } else {
                0
            };
            return StreakOutcome::Advanced { count, reward };
        }

        StreakOutcome::Unchanged
    }
}
