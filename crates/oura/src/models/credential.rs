//! Credential record for one provider account

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default token type when the provider doesn't send one
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Stored OAuth credentials for an account
///
/// At most one record exists per `account_id`. The refresh token is
/// single-use: after every successful refresh the new value replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Provider user id (unique key)
    pub account_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// When the access token stops being valid (`None` = never expires)
    pub expires_at: Option<DateTime<Utc>>,
    /// Space-delimited scopes granted by the provider
    pub granted_scopes: String,
    /// Last time this record was written
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential with the default token type and no scopes
    pub fn new(
        account_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: None,
            granted_scopes: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Set the expiry instant
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the granted scopes
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.granted_scopes = scopes.into();
        self
    }

    /// Whether the access token is expired at `now`.
    ///
    /// Reaching the expiry instant exactly counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Whether the access token is expired right now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Scopes as a list
    pub fn scopes(&self) -> Vec<&str> {
        self.granted_scopes.split_whitespace().collect()
    }
}

/// Parse a timestamp read back from storage.
///
/// RFC 3339 values keep their offset and are converted to UTC. Values
/// without an offset are taken to already be UTC.
pub fn parse_stored_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Unrecognized timestamp: {value}"))
}
