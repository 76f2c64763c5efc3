//! In-memory user store — a map behind a mutex.

use super::UserStore;
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use florence_core::error::FlorenceError;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Default backend. Lifetime of the data = lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_or_create(
        &self,
        sender_id: &str,
        display_name: &str,
        starting_tokens: i64,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), FlorenceError> {
        let mut users = self.users.lock().await;
        if let Some(existing) = users.get(sender_id) {
            return Ok((existing.clone(), false));
        }
        let user = User::new(sender_id, display_name, starting_tokens, now);
        users.insert(sender_id.to_string(), user.clone());
        Ok((user, true))
    }

    async fn get(&self, sender_id: &str) -> Result<Option<User>, FlorenceError> {
        Ok(self.users.lock().await.get(sender_id).cloned())
    }

    async fn update(&self, user: &User) -> Result<(), FlorenceError> {
        let mut users = self.users.lock().await;
        match users.get_mut(&user.sender_id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(FlorenceError::Store(format!(
                "update for unknown user {}",
                user.sender_id
            ))),
        }
    }

    async fn count(&self) -> Result<u64, FlorenceError> {
        Ok(self.users.lock().await.len() as u64)
    }
}
