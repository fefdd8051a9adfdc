//! Typed failures surfaced by the OAuth manager and the API client
//!
//! Functions in this crate return `anyhow::Result`; callers that need to
//! branch on a specific failure use `err.downcast_ref::<T>()`.

use std::error::Error as StdError;

/// Boxed cause carried by [`RequestExhaustedError`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The `state` echoed by the provider does not match the one we issued.
///
/// Treated as a possible CSRF attempt. The authorization flow must be aborted.
#[derive(Debug, thiserror::Error)]
#[error("OAuth state mismatch: the authorization response did not echo the issued state")]
pub struct AuthorizationError;

/// The token endpoint rejected an authorization code
#[derive(Debug, thiserror::Error)]
#[error("Failed to exchange authorization code (status {status:?}): {body}")]
pub struct TokenExchangeError {
    /// HTTP status, or `None` when the request never got a response
    pub status: Option<u16>,
    /// Provider response body (or transport error text)
    pub body: String,
}

/// The token endpoint rejected a refresh token
#[derive(Debug, thiserror::Error)]
#[error("Failed to refresh access token (status {status:?}): {body}")]
pub struct TokenRefreshError {
    pub status: Option<u16>,
    pub body: String,
}

/// No usable credentials exist for the account.
///
/// The caller has to run the authorization flow again.
#[derive(Debug, thiserror::Error)]
#[error("No valid access token for account {account_id}; run `ringsync auth` first")]
pub struct AuthenticationError {
    pub account_id: String,
}

/// A non-success HTTP answer from the data API
#[derive(Debug, thiserror::Error)]
#[error("HTTP {status} from {url}: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// A request kept failing until its retry budget ran out
#[derive(Debug, thiserror::Error)]
#[error("Request to {endpoint} failed after {attempts} attempts")]
pub struct RequestExhaustedError {
    pub endpoint: String,
    pub attempts: u32,
    #[source]
    pub source: BoxError,
}
