//! Oura v2 REST API integration
//!
//! This module provides:
//! - API client with pagination, retry and rate-limit handling
//! - Field mappers from raw JSON to typed records

mod client;
pub mod normalize;
mod retry;

use std::time::Duration;

pub use client::{OuraClient, Sleeper};
pub use normalize::{map_personal_info, map_record};
pub use retry::RetryPolicy;

/// Shared HTTP agent settings.
///
/// Status codes are inspected by the callers, so ureq must not turn them
/// into errors.
pub(crate) fn http_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(30)))
        .build();
    ureq::Agent::new_with_config(config)
}

/// API response types
pub mod responses {
    use serde::Deserialize;
    use serde_json::Value;

    /// One page of a collection endpoint
    #[derive(Debug, Deserialize)]
    pub struct Page {
        #[serde(default)]
        pub data: Vec<Value>,
        pub next_token: Option<String>,
    }
}
