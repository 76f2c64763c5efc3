//! Serde default functions for config fields.

pub(super) fn default_name() -> String {
    "Florence*".to_string()
}

pub(super) fn default_data_dir() -> String {
    "~/.florence".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_starting_tokens() -> i64 {
    100
}

pub(super) fn default_grant_interval_hours() -> i64 {
    8
}

pub(super) fn default_grant_amount() -> i64 {
    10
}

pub(super) fn default_low_balance_threshold() -> i64 {
    4
}

pub(super) fn default_milestone_interval() -> u32 {
    10
}

pub(super) fn default_milestone_reward() -> i64 {
    10
}

pub(super) fn default_max_attachments() -> usize {
    5
}

pub(super) fn default_max_history_turns() -> usize {
    20
}

pub(super) fn default_max_context_turns() -> usize {
    10
}

pub(super) fn default_payment_keywords() -> Vec<String> {
    ["payment", "flutterwave", "florence", "1000"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(super) fn default_bundle_tokens() -> i64 {
    10
}

pub(super) fn default_payment_link() -> String {
    "https://flutterwave.com/pay/jinkrgxqambh".to_string()
}

pub(super) fn default_price_line() -> String {
    "Tokens cost 1000 naira for 10.".to_string()
}

pub(super) fn default_provider() -> String {
    "anthropic".to_string()
}

pub(super) fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

pub(super) fn default_max_tokens() -> u32 {
    1024
}

pub(super) fn default_memory_backend() -> String {
    "memory".to_string()
}

pub(super) fn default_db_path() -> String {
    "~/.florence/data/users.db".to_string()
}
