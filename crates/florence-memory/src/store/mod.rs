//! User store backends.
//!
//! - `memory` — HashMap behind a mutex, the default; no durability.
//! - `sqlite` — sqlx-backed table, records survive restarts.

mod memory;
mod sqlite;

#[cfg(test)]
mod tests;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use florence_core::{config::MemoryConfig, error::FlorenceError};
use std::sync::Arc;

/// Backend-agnostic access to user records.
///
/// `get_or_create` must be idempotent under concurrent duplicate events
/// for the same id: exactly one record is created, and exactly one caller
/// observes `created = true` (so the welcome flow runs once).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Return the existing record, or insert a fresh one seeded with
    /// `starting_tokens`. The boolean is true iff this call created it.
    async fn get_or_create(
        &self,
        sender_id: &str,
        display_name: &str,
        starting_tokens: i64,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), FlorenceError>;

    /// Look up a record by id.
    async fn get(&self, sender_id: &str) -> Result<Option<User>, FlorenceError>;

    /// Persist all mutable fields of the record.
    async fn update(&self, user: &User) -> Result<(), FlorenceError>;

    /// Number of known users.
    async fn count(&self) -> Result<u64, FlorenceError>;
}

/// Open the configured backend.
pub async fn open(config: &MemoryConfig) -> Result<Arc<dyn UserStore>, FlorenceError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => Ok(Arc::new(SqliteStore::new(config).await?)),
        other => Err(FlorenceError::Config(format!(
            "unknown memory backend '{other}' (expected \"memory\" or \"sqlite\")"
        ))),
    }
}
