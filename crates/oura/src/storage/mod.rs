//! Storage layer for credentials and synced records
//!
//! This module provides:
//! - Trait definitions for token and record storage
//! - In-memory implementation for tests
//! - SQLite implementation for persistence

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, TokenStore};
