use super::*;
use crate::user::User;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

fn ts(s: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .unwrap()
        .with_timezone(&Utc)
}

async fn sqlite_store() -> SqliteStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqliteStore::run_migrations(&pool).await.unwrap();
    SqliteStore { pool }
}

#[tokio::test]
async fn test_memory_get_or_create_is_idempotent() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let (user, created) = store.get_or_create("tg:1", "Ada Lovelace", 100, now).await.unwrap();
    assert!(created);
    assert_eq!(user.tokens, 100);
    assert_eq!(user.streak_count, 0);

    let (again, created) = store.get_or_create("tg:1", "Ada Lovelace", 100, now).await.unwrap();
    assert!(!created);
    assert_eq!(again, user);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_memory_concurrent_creation_yields_one_record() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let (_, created) = store.get_or_create("tg:7", "Grace", 100, now).await.unwrap();
            created
        }));
    }

    let mut created_count = 0;
    for h in handles {
        if h.await.unwrap() {
            created_count += 1;
        }
    }
    assert_eq!(created_count, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_memory_update_round_trip() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let (mut user, _) = store.get_or_create("tg:2", "Bob", 100, now).await.unwrap();

    user.tokens = 42;
    user.streak_count = 3;
    user.history.push_exchange("hi", "hello", 20);
    store.update(&user).await.unwrap();

    let fetched = store.get("tg:2").await.unwrap().unwrap();
    assert_eq!(fetched.tokens, 42);
    assert_eq!(fetched.streak_count, 3);
    assert_eq!(fetched.history.len(), 2);
}

#[tokio::test]
async fn test_memory_update_unknown_user_errors() {
    let store = MemoryStore::new();
    let user = User::new("tg:ghost", "Nobody", 100, Utc::now());
    assert!(store.update(&user).await.is_err());
}

#[tokio::test]
async fn test_sqlite_get_or_create_and_count() {
    let store = sqlite_store().await;
    let now = ts("2025-06-01T12:00:00Z");

    let (user, created) = store.get_or_create("tg:1", "Ada Lovelace", 100, now).await.unwrap();
    assert!(created);
    assert_eq!(user.sender_id, "tg:1");
    assert_eq!(user.tokens, 100);
    assert_eq!(user.created_at, now);
    assert!(user.pending_payment_at.is_none());
    assert!(user.history.is_empty());

    let (_, created) = store.get_or_create("tg:1", "Ada Lovelace", 100, now).await.unwrap();
    assert!(!created);

    store.get_or_create("tg:2", "Bob", 100, now).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_sqlite_update_round_trip() {
    let store = sqlite_store().await;
    let now = ts("2025-06-01T12:00:00Z");
    let (mut user, _) = store.get_or_create("tg:3", "Carol Danvers", 100, now).await.unwrap();

    user.tokens = 7;
    user.streak_count = 10;
    user.streak_date = ts("2025-06-02T00:00:01Z");
    user.last_activity_at = ts("2025-06-02T09:30:00Z");
    user.pending_payment_at = Some(ts("2025-06-02T09:00:00Z"));
    user.history.push_exchange("what is rust", "a systems language", 20);

    store.update(&user).await.unwrap();

    let fetched = store.get("tg:3").await.unwrap().unwrap();
    assert_eq!(fetched, user);
    assert_eq!(fetched.history.turns()[1].content, "a systems language");
}

#[tokio::test]
async fn test_sqlite_get_unknown_returns_none() {
    let store = sqlite_store().await;
    assert!(store.get("tg:missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sqlite_update_unknown_user_errors() {
    let store = sqlite_store().await;
    let user = User::new("tg:ghost", "Nobody", 100, Utc::now());
    assert!(store.update(&user).await.is_err());
}

#[tokio::test]
async fn test_sqlite_migrations_are_idempotent() {
    let store = sqlite_store().await;
    SqliteStore::run_migrations(&store.pool).await.unwrap();
    SqliteStore::run_migrations(&store.pool).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_open_rejects_unknown_backend() {
    let config = florence_core::config::MemoryConfig {
        backend: "postgres".to_string(),
        db_path: "/tmp/x.db".to_string(),
    };
    assert!(open(&config).await.is_err());
}
