use super::*;

#[test]
fn test_economy_defaults() {
    let eco = EconomyConfig::default();
    assert_eq!(eco.starting_tokens, 100);
    assert_eq!(eco.grant_interval_hours, 8);
    assert_eq!(eco.grant_amount, 10);
    assert_eq!(eco.low_balance_threshold, 4);
    assert_eq!(eco.milestone_interval, 10);
    assert_eq!(eco.milestone_reward, 10);
    assert_eq!(eco.max_attachments, 5);
}

#[test]
fn test_history_defaults() {
    let h = HistoryConfig::default();
    assert_eq!(h.max_history_turns, 20);
    assert_eq!(h.max_context_turns, 10);
}

#[test]
fn test_economy_from_toml_partial() {
    let toml_str = r#"
        starting_tokens = 10
        grant_amount = 5
    "#;
    let eco: EconomyConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(eco.starting_tokens, 10);
    assert_eq!(eco.grant_amount, 5);
    // Untouched fields keep their defaults.
    assert_eq!(eco.grant_interval_hours, 8);
    assert_eq!(eco.max_attachments, 5);
}

#[test]
fn test_payment_defaults_include_keywords() {
    let pay = PaymentConfig::default();
    assert!(pay.keywords.iter().any(|k| k == "flutterwave"));
    assert_eq!(pay.bundle_tokens, 10);
    assert!(pay.payment_link.starts_with("https://"));
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [florence]
        name = "Florence*"

        [economy]
        starting_tokens = 50

        [channel.telegram]
        enabled = true
        bot_token = "123:abc"

        [provider.anthropic]
        model = "claude-3-5-sonnet-20241022"

        [memory]
        backend = "sqlite"
        db_path = ":memory:"
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.economy.starting_tokens, 50);
    assert_eq!(cfg.memory.backend, "sqlite");
    let tg = cfg.channel.telegram.unwrap();
    assert!(tg.enabled);
    assert_eq!(tg.bot_token, "123:abc");
    // Sections absent from the file come back as defaults.
    assert_eq!(cfg.history.max_history_turns, 20);
    assert_eq!(cfg.payment.bundle_tokens, 10);
}

#[test]
fn test_empty_config_is_all_defaults() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.economy.starting_tokens, 100);
    assert_eq!(cfg.provider.default, "anthropic");
    assert!(cfg.channel.telegram.is_none());
    assert!(cfg.notify.operator_targets.is_empty());
}

#[test]
fn test_shellexpand_home() {
    if std::env::var_os("HOME").is_some() {
        let expanded = shellexpand("~/x/y.db");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/x/y.db"));
    }
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
}
