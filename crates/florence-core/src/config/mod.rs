mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FlorenceError;
use defaults::*;

/// Top-level Florence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub florence: FlorenceConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlorenceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for FlorenceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Token economy settings: periodic grants, streak milestones, limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Tokens a brand-new user is seeded with.
    #[serde(default = "default_starting_tokens")]
    pub starting_tokens: i64,
    /// Hours between periodic activity grants.
    #[serde(default = "default_grant_interval_hours")]
    pub grant_interval_hours: i64,
    /// Tokens granted per elapsed interval.
    #[serde(default = "default_grant_amount")]
    pub grant_amount: i64,
    /// Grants only apply at or below this balance.
    #[serde(default = "default_low_balance_threshold")]
    pub low_balance_threshold: i64,
    /// Streak counts that are a multiple of this earn a bonus.
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: u32,
    /// Bonus tokens at each streak milestone.
    #[serde(default = "default_milestone_reward")]
    pub milestone_reward: i64,
    /// Maximum media items accepted on a single message.
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_tokens: default_starting_tokens(),
            grant_interval_hours: default_grant_interval_hours(),
            grant_amount: default_grant_amount(),
            low_balance_threshold: default_low_balance_threshold(),
            milestone_interval: default_milestone_interval(),
            milestone_reward: default_milestone_reward(),
            max_attachments: default_max_attachments(),
        }
    }
}

/// Conversation history bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Turns retained per user after each exchange.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// Most recent turns sent as prior context on a completion request.
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            max_context_turns: default_max_context_turns(),
        }
    }
}

/// Payment-proof verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// At least one of these must appear in the extracted proof text.
    #[serde(default = "default_payment_keywords")]
    pub keywords: Vec<String>,
    /// Tokens credited on a verified proof.
    #[serde(default = "default_bundle_tokens")]
    pub bundle_tokens: i64,
    /// Where users pay.
    #[serde(default = "default_payment_link")]
    pub payment_link: String,
    /// Price description shown by /payments.
    #[serde(default = "default_price_line")]
    pub price_line: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            keywords: default_payment_keywords(),
            bundle_tokens: default_bundle_tokens(),
            payment_link: default_payment_link(),
            price_line: default_price_line(),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub default: String,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

/// Anthropic Messages API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Read from ANTHROPIC_API_KEY when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
}

/// User store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "memory" or "sqlite".
    #[serde(default = "default_memory_backend")]
    pub backend: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            db_path: default_db_path(),
        }
    }
}

/// Operator notifications (new-user alerts).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Platform targets that receive a note when a new user joins.
    #[serde(default)]
    pub operator_targets: Vec<String>,
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, FlorenceError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| FlorenceError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| FlorenceError::Config(format!("failed to parse config: {e}")))?;

    Ok(config)
}
