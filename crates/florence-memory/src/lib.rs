//! # florence-memory
//!
//! One record per external chat identity, behind a backend-agnostic
//! `UserStore` trait. Ships an in-memory map (store lifetime = process
//! lifetime) and a SQLite backend for deployments that want the records
//! to survive restarts.

mod store;
mod user;

pub use store::{open, MemoryStore, SqliteStore, UserStore};
pub use user::User;
