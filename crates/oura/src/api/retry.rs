//! Retry timing for API requests
//!
//! Pure functions so the waits can be tested without a server.

use std::time::Duration;

/// How a request reacts to rate limits and transient failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per request (401 retries and failures count, 429 waits don't)
    pub max_retries: u32,
    /// Wait used when a 429 carries no usable Retry-After header
    pub default_retry_after: Duration,
    /// Upper bound on the total time one request may spend waiting out 429s
    pub max_rate_limit_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            default_retry_after: Duration::from_secs(60),
            max_rate_limit_wait: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl RetryPolicy {
    /// Wait requested by a 429 response.
    ///
    /// Only integer seconds are understood; anything else falls back to
    /// `default_retry_after`.
    pub fn retry_after(&self, header: Option<&str>) -> Duration {
        header
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after)
    }

    /// Backoff before retrying after failed attempt number `attempt` (from 0)
    pub fn backoff(attempt: u32) -> Duration {
        Duration::from_secs(1u64 << attempt.min(20))
    }

    /// Whether `waited` so far exceeds the rate-limit budget
    pub fn rate_limit_exceeded(&self, waited: Duration) -> bool {
        self.max_rate_limit_wait.is_some_and(|cap| waited > cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(RetryPolicy::backoff(0), Duration::from_secs(1));
        assert_eq!(RetryPolicy::backoff(1), Duration::from_secs(2));
        assert_eq!(RetryPolicy::backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_after_parsing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retry_after(Some("5")), Duration::from_secs(5));
        assert_eq!(policy.retry_after(Some(" 12 ")), Duration::from_secs(12));
        assert_eq!(policy.retry_after(None), Duration::from_secs(60));
        // HTTP-date form is not supported
        assert_eq!(
            policy.retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")),
            Duration::from_secs(60)
        );
        assert_eq!(policy.retry_after(Some("-3")), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_budget() {
        let policy = RetryPolicy::default();
        assert!(!policy.rate_limit_exceeded(Duration::from_secs(3600)));
        assert!(policy.rate_limit_exceeded(Duration::from_secs(3601)));

        let unbounded = RetryPolicy {
            max_rate_limit_wait: None,
            ..RetryPolicy::default()
        };
        assert!(!unbounded.rate_limit_exceeded(Duration::from_secs(u32::MAX as u64)));
    }
}
