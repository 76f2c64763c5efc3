//! # florence-channels
//!
//! Messaging platform integrations for Florence.

pub mod telegram;

pub use telegram::TelegramChannel;
