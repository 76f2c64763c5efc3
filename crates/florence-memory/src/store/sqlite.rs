//! SQLite-backed user store.

use super::UserStore;
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use florence_core::{
    config::{shellexpand, MemoryConfig},
    context::Conversation,
    error::FlorenceError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// A fully loaded users row, column order matching the table.
type UserRow = (
    String,         // sender_id
    String,         // display_name
    i64,            // tokens
    i64,            // streak_count
    String,         // streak_date
    String,         // last_activity_at
    String,         // last_grant_at
    String,         // history (JSON)
    Option<String>, // pending_payment_at
    String,         // created_at
);

const SELECT_USER: &str = "SELECT sender_id, display_name, tokens, streak_count, streak_date, \
     last_activity_at, last_grant_at, history, pending_payment_at, created_at \
     FROM users WHERE sender_id = ?";

/// Durable backend. Timestamps are stored as RFC 3339 text, history as a
/// JSON blob — one row per user, no joins.
pub struct SqliteStore {
    pub(super) pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations.
    pub async fn new(config: &MemoryConfig) -> Result<Self, FlorenceError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FlorenceError::Store(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| FlorenceError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| FlorenceError::Store(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("User store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Run SQL migrations, tracking which have already been applied.
    pub(super) async fn run_migrations(pool: &SqlitePool) -> Result<(), FlorenceError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| FlorenceError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_users", include_str!("../../migrations/001_users.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        FlorenceError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| FlorenceError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    FlorenceError::Store(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }

    fn row_to_user(row: UserRow) -> Result<User, FlorenceError> {
        let (
            sender_id,
            display_name,
            tokens,
            streak_count,
            streak_date,
            last_activity_at,
            last_grant_at,
            history,
            pending_payment_at,
            created_at,
        ) = row;

        let history: Conversation = serde_json::from_str(&history)
            .map_err(|e| FlorenceError::Store(format!("corrupt history for {sender_id}: {e}")))?;

        Ok(User {
            sender_id,
            display_name,
            tokens,
            streak_count: streak_count as u32,
            streak_date: parse_ts(&streak_date)?,
            last_activity_at: parse_ts(&last_activity_at)?,
            last_grant_at: parse_ts(&last_grant_at)?,
            history,
            pending_payment_at: pending_payment_at.as_deref().map(parse_ts).transpose()?,
            created_at: parse_ts(&created_at)?,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, FlorenceError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| FlorenceError::Store(format!("bad timestamp '{s}': {e}")))
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_or_create(
        &self,
        sender_id: &str,
        display_name: &str,
        starting_tokens: i64,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), FlorenceError> {
        let now_s = now.to_rfc3339();
        let empty_history =
            serde_json::to_string(&Conversation::new()).map_err(FlorenceError::Serialization)?;

        // Atomic insert-if-absent: exactly one concurrent caller gets a
        // nonzero rows_affected for a given id.
        let result = sqlx::query(
            "INSERT INTO users (sender_id, display_name, tokens, streak_count, streak_date, \
             last_activity_at, last_grant_at, history, pending_payment_at, created_at) \
             VALUES (?, ?, ?, 0, ?, ?, ?, ?, NULL, ?) \
             ON CONFLICT(sender_id) DO NOTHING",
        )
        .bind(sender_id)
        .bind(display_name)
        .bind(starting_tokens)
        .bind(&now_s)
        .bind(&now_s)
        .bind(&now_s)
        .bind(&empty_history)
        .bind(&now_s)
        .execute(&self.pool)
        .await
        .map_err(|e| FlorenceError::Store(format!("insert user failed: {e}")))?;

        let created = result.rows_affected() > 0;

        let row: UserRow = sqlx::query_as(SELECT_USER)
            .bind(sender_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FlorenceError::Store(format!("fetch user failed: {e}")))?;

        Ok((Self::row_to_user(row)?, created))
    }

    async fn get(&self, sender_id: &str) -> Result<Option<User>, FlorenceError> {
        let row: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(sender_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FlorenceError::Store(format!("query failed: {e}")))?;

        row.map(Self::row_to_user).transpose()
    }

    async fn update(&self, user: &User) -> Result<(), FlorenceError> {
        let history = serde_json::to_string(&user.history).map_err(FlorenceError::Serialization)?;

        let result = sqlx::query(
            "UPDATE users SET display_name = ?, tokens = ?, streak_count = ?, streak_date = ?, \
             last_activity_at = ?, last_grant_at = ?, history = ?, pending_payment_at = ? \
             WHERE sender_id = ?",
        )
        .bind(&user.display_name)
        .bind(user.tokens)
        .bind(user.streak_count as i64)
        .bind(user.streak_date.to_rfc3339())
        .bind(user.last_activity_at.to_rfc3339())
        .bind(user.last_grant_at.to_rfc3339())
        .bind(&history)
        .bind(user.pending_payment_at.map(|t| t.to_rfc3339()))
        .bind(&user.sender_id)
        .execute(&self.pool)
        .await
        .map_err(|e| FlorenceError::Store(format!("update user failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(FlorenceError::Store(format!(
                "update for unknown user {}",
                user.sender_id
            )));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, FlorenceError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FlorenceError::Store(format!("count failed: {e}")))?;
        Ok(n as u64)
    }
}
