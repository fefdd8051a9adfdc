//! Oura crate - Business logic for syncing wearable data
//!
//! This crate provides:
//! - Domain models (Credential, DataType, typed daily records)
//! - OAuth2 authorization-code flow with refresh-token rotation
//! - Oura v2 API client with pagination, retry and rate-limit handling
//! - Storage trait abstractions with SQLite and in-memory backends
//! - Idempotent sync engine

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod oauth;
pub mod storage;
pub mod sync;

pub use crate::api::{OuraClient, RetryPolicy, map_personal_info, map_record};
pub use crate::config::OuraSettings;
pub use crate::error::{
    AuthenticationError, AuthorizationError, HttpStatusError, RequestExhaustedError,
    TokenExchangeError, TokenRefreshError,
};
pub use crate::models::{Credential, DataType, Record, RecordKind, UpsertOutcome};
pub use crate::oauth::{AuthorizationRequest, OAuthManager, TokenResponse};
pub use crate::storage::{InMemoryStore, RecordStore, SqliteStore, TokenStore};
pub use crate::sync::{
    DataTypeOutcome, SyncOptions, SyncReport, resolve_date_range, sync_daily_data,
    sync_personal_info,
};
