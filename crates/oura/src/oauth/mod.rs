//! OAuth2 authorization-code grant and refresh-token rotation
//!
//! [`OAuthManager`] owns the token endpoint conversation and persists every
//! token it receives through a [`TokenStore`](crate::storage::TokenStore).
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

mod callback;
mod manager;
mod state;

use serde::{Deserialize, Serialize};

pub use callback::{CallbackParams, bind_redirect_listener, parse_callback, wait_for_callback};
pub use manager::{AuthorizationRequest, DEFAULT_EXPIRES_IN_SECS, OAuthManager};
pub use state::generate_state;

/// Token endpoint response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_token_response() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "a"}"#).unwrap();
        assert_eq!(token.access_token, "a");
        assert!(token.refresh_token.is_none());
        assert!(token.expires_in.is_none());
    }
}
