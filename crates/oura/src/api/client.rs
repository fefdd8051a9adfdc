//! Oura API HTTP client
//!
//! Provides authenticated, paginated access to the v2 collection endpoints.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::http_agent;
use super::responses::Page;
use super::retry::RetryPolicy;
use crate::error::{AuthenticationError, BoxError, HttpStatusError, RequestExhaustedError};
use crate::models::{DataType, RangeKind};
use crate::oauth::OAuthManager;

const PERSONAL_INFO_ENDPOINT: &str = "/v2/usercollection/personal_info";

/// Blocking wait used between retries
pub type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// What one HTTP exchange amounted to
enum Attempt {
    Success(Value),
    RateLimited(Option<String>),
    Unauthorized,
    Failed(BoxError),
}

/// Oura API client bound to one account
pub struct OuraClient {
    oauth: Arc<OAuthManager>,
    account_id: String,
    base_url: String,
    agent: ureq::Agent,
    policy: RetryPolicy,
    sleeper: Sleeper,
}

impl OuraClient {
    /// Create a client that authenticates as `account_id`
    pub fn new(oauth: Arc<OAuthManager>, account_id: impl Into<String>) -> Self {
        let base_url = oauth.settings().api_base_url.trim_end_matches('/').to_string();
        Self {
            oauth,
            account_id: account_id.into(),
            base_url,
            agent: http_agent(),
            policy: RetryPolicy::default(),
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace how the client waits between retries
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// GET `endpoint` with the policy's retry budget
    pub fn request(&self, endpoint: &str, query: &[(String, String)]) -> Result<Value> {
        self.request_with_retries(endpoint, query, self.policy.max_retries)
    }

    /// GET `endpoint`, retrying failures up to `max_retries` attempts.
    ///
    /// 429 answers are waited out without using an attempt. A 401 refreshes
    /// the stored credential and retries at once.
    pub fn request_with_retries(
        &self,
        endpoint: &str,
        query: &[(String, String)],
        max_retries: u32,
    ) -> Result<Value> {
        let max_retries = max_retries.max(1);
        let url = format!("{}{}", self.base_url, endpoint);

        let mut access_token = self
            .oauth
            .get_valid_access_token(&self.account_id)?
            .ok_or_else(|| AuthenticationError {
                account_id: self.account_id.clone(),
            })?;

        let mut attempt: u32 = 0;
        let mut rate_limited: u32 = 0;
        let mut rate_limit_waited = Duration::ZERO;

        loop {
            match self.send(&url, &access_token, query)? {
                Attempt::Success(value) => return Ok(value),

                Attempt::RateLimited(retry_after) => {
                    rate_limited += 1;
                    let wait = self.policy.retry_after(retry_after.as_deref());
                    rate_limit_waited += wait;
                    if self.policy.rate_limit_exceeded(rate_limit_waited) {
                        warn!(
                            "Rate limit wait for {} exceeded {:?}, giving up",
                            endpoint, self.policy.max_rate_limit_wait
                        );
                        // Every request sent so far, 429s included
                        return Err(self.exhausted(endpoint, attempt + rate_limited, 429, &url));
                    }
                    warn!("Rate limited. Waiting {} seconds...", wait.as_secs());
                    (self.sleeper)(wait);
                }

                Attempt::Unauthorized => {
                    // Rotate before the attempt check
                    info!("Token invalid, attempting refresh...");
                    let credential =
                        self.oauth
                            .load(&self.account_id)?
                            .ok_or_else(|| AuthenticationError {
                                account_id: self.account_id.clone(),
                            })?;
                    access_token = self.oauth.refresh_and_save(&credential)?.access_token;

                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(self.exhausted(endpoint, attempt, 401, &url));
                    }
                }

                Attempt::Failed(err) => {
                    if attempt + 1 >= max_retries {
                        warn!(
                            "Request to {} failed after {} attempts: {}",
                            endpoint, max_retries, err
                        );
                        return Err(RequestExhaustedError {
                            endpoint: endpoint.to_string(),
                            attempts: attempt + 1,
                            source: err,
                        }
                        .into());
                    }
                    let delay = RetryPolicy::backoff(attempt);
                    warn!(
                        "Request failed, retrying in {}s... ({}/{}): {}",
                        delay.as_secs(),
                        attempt + 1,
                        max_retries,
                        err
                    );
                    (self.sleeper)(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Fetch every page of a collection endpoint.
    ///
    /// Follows `next_token` until it is absent or empty and returns the
    /// `data` items in response order.
    pub fn fetch_all_pages(
        &self,
        endpoint: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        extra_params: &[(String, String)],
    ) -> Result<Vec<Value>> {
        let mut params = extra_params.to_vec();
        if let Some(start) = start_date {
            params.push(("start_date".to_string(), start.to_string()));
        }
        if let Some(end) = end_date {
            params.push(("end_date".to_string(), end.to_string()));
        }

        let mut all_data = Vec::new();
        loop {
            let response = self.request(endpoint, &params)?;
            let page: Page = serde_json::from_value(response)
                .with_context(|| format!("Unexpected page shape from {endpoint}"))?;
            all_data.extend(page.data);

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    debug!(
                        "Fetching next page (token: {}...)",
                        token.chars().take(20).collect::<String>()
                    );
                    params.retain(|(key, _)| key != "next_token");
                    params.push(("next_token".to_string(), token));
                }
                None => break,
            }
        }

        info!("Fetched {} items from {}", all_data.len(), endpoint);
        Ok(all_data)
    }

    /// Fetch a collection over a day range using the parameters its endpoint expects
    pub fn fetch_collection(
        &self,
        data_type: DataType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Value>> {
        let endpoint = data_type.endpoint();
        match data_type.range_kind() {
            RangeKind::Date => {
                let (start, end) = (date_param(start), date_param(end));
                self.fetch_all_pages(&endpoint, Some(&start), Some(&end), &[])
            }
            RangeKind::DateTime => {
                let start = start.and_time(NaiveTime::MIN).and_utc();
                let end = end
                    .and_hms_opt(23, 59, 59)
                    .map(|t| t.and_utc())
                    .context("Invalid end of day")?;
                self.heart_rate(start, end)
            }
            RangeKind::None => self.fetch_all_pages(&endpoint, None, None, &[]),
        }
    }

    // Personal info

    /// Get the account holder's profile (single object, not paginated)
    pub fn personal_info(&self) -> Result<Value> {
        self.request(PERSONAL_INFO_ENDPOINT, &[])
    }

    /// Look up the account id that owns `access_token`.
    ///
    /// Used right after the code exchange, before any credential is stored.
    /// Sent once, without retries.
    pub fn identify(&self, access_token: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, PERSONAL_INFO_ENDPOINT);
        match self.send(&url, access_token, &[])? {
            Attempt::Success(value) => value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .context("personal_info response has no id"),
            Attempt::RateLimited(_) => Err(HttpStatusError {
                status: 429,
                url,
                body: String::new(),
            }
            .into()),
            Attempt::Unauthorized => Err(HttpStatusError {
                status: 401,
                url,
                body: String::new(),
            }
            .into()),
            Attempt::Failed(err) => Err(anyhow::anyhow!("Failed to identify account: {err}")),
        }
    }

    // Daily summaries

    pub fn daily_activity(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailyActivity, start, end)
    }

    pub fn daily_sleep(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailySleep, start, end)
    }

    pub fn daily_readiness(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailyReadiness, start, end)
    }

    pub fn daily_spo2(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailySpo2, start, end)
    }

    pub fn daily_stress(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailyStress, start, end)
    }

    pub fn daily_resilience(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailyResilience, start, end)
    }

    pub fn daily_cardiovascular_age(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::DailyCardiovascularAge, start, end)
    }

    // Time series

    /// Heart rate samples between two instants
    pub fn heart_rate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Value>> {
        let params = [
            (
                "start_datetime".to_string(),
                start.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "end_datetime".to_string(),
                end.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ];
        self.fetch_all_pages(&DataType::HeartRate.endpoint(), None, None, &params)
    }

    // Sleep sessions

    pub fn sleep(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::Sleep, start, end)
    }

    pub fn sleep_time(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::SleepTime, start, end)
    }

    // Workouts, sessions and tags

    pub fn workouts(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::Workout, start, end)
    }

    pub fn sessions(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::Session, start, end)
    }

    pub fn tags(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::Tag, start, end)
    }

    pub fn enhanced_tags(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::EnhancedTag, start, end)
    }

    // Other

    pub fn rest_mode_periods(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::RestModePeriod, start, end)
    }

    /// Ring configuration has no date range
    pub fn ring_configuration(&self) -> Result<Vec<Value>> {
        self.fetch_all_pages(&DataType::RingConfiguration.endpoint(), None, None, &[])
    }

    pub fn vo2_max(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.fetch_dated(DataType::Vo2Max, start, end)
    }

    fn fetch_dated(&self, data_type: DataType, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        let (start, end) = (date_param(start), date_param(end));
        self.fetch_all_pages(&data_type.endpoint(), Some(&start), Some(&end), &[])
    }

    /// One GET. Only a 2xx body that isn't JSON is returned as an error;
    /// everything else is classified for the retry loop.
    fn send(&self, url: &str, access_token: &str, query: &[(String, String)]) -> Result<Attempt> {
        let mut request = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {access_token}"))
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }

        let mut response = match request.call() {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Failed(Box::new(e))),
        };

        let status = response.status().as_u16();
        match status {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(Attempt::RateLimited(retry_after))
            }
            401 => Ok(Attempt::Unauthorized),
            200..=299 => {
                let body = match response.body_mut().read_to_string() {
                    Ok(body) => body,
                    Err(e) => return Ok(Attempt::Failed(Box::new(e))),
                };
                let value = serde_json::from_str(&body)
                    .with_context(|| format!("Invalid JSON in response from {url}"))?;
                Ok(Attempt::Success(value))
            }
            _ => {
                let body = response.body_mut().read_to_string().unwrap_or_default();
                Ok(Attempt::Failed(Box::new(HttpStatusError {
                    status,
                    url: url.to_string(),
                    body,
                })))
            }
        }
    }

    fn exhausted(&self, endpoint: &str, attempts: u32, status: u16, url: &str) -> anyhow::Error {
        RequestExhaustedError {
            endpoint: endpoint.to_string(),
            attempts,
            source: Box::new(HttpStatusError {
                status,
                url: url.to_string(),
                body: String::new(),
            }),
        }
        .into()
    }
}

fn date_param(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OuraSettings;
    use crate::models::Credential;
    use crate::storage::{InMemoryStore, TokenStore};
    use chrono::Duration as ChronoDuration;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use std::sync::Mutex;

    const ENDPOINT: &str = "/v2/usercollection/daily_sleep";

    struct Fixture {
        client: OuraClient,
        store: Arc<InMemoryStore>,
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    /// Client with a valid stored token and a recording sleeper
    fn fixture(server: &ServerGuard) -> Fixture {
        let mut settings = OuraSettings::new("client", "secret");
        settings.api_base_url = server.url();
        settings.token_url = format!("{}/oauth/token", server.url());

        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_credential(
                &Credential::new("user-1", "access-1", "refresh-1")
                    .with_expires_at(Utc::now() + ChronoDuration::hours(1)),
            )
            .unwrap();

        let oauth = Arc::new(OAuthManager::new(settings, store.clone()));
        let sleeps = Arc::new(Mutex::new(Vec::new()));
        let recorded = sleeps.clone();
        let client = OuraClient::new(oauth, "user-1")
            .with_sleeper(move |d| recorded.lock().unwrap().push(d));

        Fixture {
            client,
            store,
            sleeps,
        }
    }

    fn sleeps(f: &Fixture) -> Vec<Duration> {
        f.sleeps.lock().unwrap().clone()
    }

    #[test]
    fn test_request_sends_bearer_and_query() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", ENDPOINT)
            .match_header("authorization", "Bearer access-1")
            .match_query(Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create();
        let f = fixture(&server);

        let value = f
            .client
            .request(ENDPOINT, &[("start_date".to_string(), "2024-01-01".to_string())])
            .unwrap();
        assert_eq!(value, json!({ "data": [] }));
        mock.assert();
        assert!(sleeps(&f).is_empty());
    }

    #[test]
    fn test_rate_limits_do_not_use_retries() {
        let mut server = Server::new();
        // Four 429s with max_retries = 3 would exhaust if they counted
        let limited = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "5")
            .expect(4)
            .create();
        let ok = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": [{"id": "a"}]}"#)
            .create();
        let f = fixture(&server);

        let value = f.client.request(ENDPOINT, &[]).unwrap();
        assert_eq!(value["data"][0]["id"], "a");
        limited.assert();
        ok.assert();
        assert_eq!(sleeps(&f), vec![Duration::from_secs(5); 4]);
    }

    #[test]
    fn test_rate_limit_without_header_waits_default() {
        let mut server = Server::new();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create();
        let f = fixture(&server);

        f.client.request(ENDPOINT, &[]).unwrap();
        assert_eq!(sleeps(&f), vec![Duration::from_secs(60)]);
    }

    #[test]
    fn test_rate_limit_budget_exhausts() {
        let mut server = Server::new();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "30")
            .create();
        let f = fixture(&server);
        let client = f.client.with_policy(RetryPolicy {
            max_rate_limit_wait: Some(Duration::from_secs(60)),
            ..RetryPolicy::default()
        });

        let err = client.request(ENDPOINT, &[]).unwrap_err();
        let exhausted = err.downcast_ref::<RequestExhaustedError>().unwrap();
        let cause = exhausted.source.downcast_ref::<HttpStatusError>().unwrap();
        assert_eq!(cause.status, 429);
        // 30 + 30 fit the budget, the third wait would not
        assert_eq!(f.sleeps.lock().unwrap().len(), 2);
        assert_eq!(exhausted.attempts, 3);
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_unauthorized_refreshes_once() {
        let mut server = Server::new();
        let rejected = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer access-1")
            .with_status(401)
            .expect(1)
            .create();
        let accepted = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer access-2")
            .with_status(200)
            .with_body(r#"{"data": [{"id": "fresh"}]}"#)
            .expect(1)
            .create();
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"access_token":"access-2","refresh_token":"refresh-2","expires_in":86400}"#,
            )
            .expect(1)
            .create();
        let f = fixture(&server);

        let value = f.client.request(ENDPOINT, &[]).unwrap();
        assert_eq!(value["data"][0]["id"], "fresh");
        rejected.assert();
        accepted.assert();
        refresh.assert();
        assert!(sleeps(&f).is_empty());

        let stored = f.store.load_credential("user-1").unwrap().unwrap();
        assert_eq!(stored.access_token, "access-2");
        assert_eq!(stored.refresh_token, "refresh-2");
    }

    #[test]
    fn test_unauthorized_on_last_attempt_still_rotates() {
        let mut server = Server::new();
        let rejected = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer access-1")
            .with_status(401)
            .expect(1)
            .create();
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()))
            .with_status(200)
            .with_body(
                r#"{"access_token":"access-2","refresh_token":"refresh-2","expires_in":86400}"#,
            )
            .expect(1)
            .create();
        let f = fixture(&server);

        let err = f.client.request_with_retries(ENDPOINT, &[], 1).unwrap_err();
        let exhausted = err.downcast_ref::<RequestExhaustedError>().unwrap();
        assert_eq!(exhausted.attempts, 1);
        rejected.assert();
        refresh.assert();

        let stored = f.store.load_credential("user-1").unwrap().unwrap();
        assert_eq!(stored.access_token, "access-2");
        assert_eq!(stored.refresh_token, "refresh-2");
    }

    #[test]
    fn test_unauthorized_refresh_failure_propagates() {
        let mut server = Server::new();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(401)
            .create();
        server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create();
        let f = fixture(&server);

        let err = f.client.request(ENDPOINT, &[]).unwrap_err();
        assert!(err.downcast_ref::<crate::error::TokenRefreshError>().is_some());
    }

    #[test]
    fn test_server_errors_back_off_then_exhaust() {
        let mut server = Server::new();
        let failing = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create();
        let f = fixture(&server);

        let err = f.client.request(ENDPOINT, &[]).unwrap_err();
        let exhausted = err.downcast_ref::<RequestExhaustedError>().unwrap();
        assert_eq!(exhausted.attempts, 3);
        let cause = exhausted.source.downcast_ref::<HttpStatusError>().unwrap();
        assert_eq!(cause.status, 503);
        assert_eq!(cause.body, "unavailable");

        failing.assert();
        // No sleep after the final attempt
        assert_eq!(
            sleeps(&f),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_error_then_success() {
        let mut server = Server::new();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create();
        server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create();
        let f = fixture(&server);

        f.client.request(ENDPOINT, &[]).unwrap();
        assert_eq!(sleeps(&f), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_invalid_json_is_not_retried() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .expect(1)
            .create();
        let f = fixture(&server);

        let err = f.client.request(ENDPOINT, &[]).unwrap_err();
        assert!(err.downcast_ref::<RequestExhaustedError>().is_none());
        mock.assert();
        assert!(sleeps(&f).is_empty());
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let mut server = Server::new();
        let mock = server.mock("GET", ENDPOINT).expect(0).create();
        let f = fixture(&server);
        let client = OuraClient::new(f.client.oauth.clone(), "someone-else");

        let err = client.request(ENDPOINT, &[]).unwrap_err();
        let auth = err.downcast_ref::<AuthenticationError>().unwrap();
        assert_eq!(auth.account_id, "someone-else");
        mock.assert();
    }

    #[test]
    fn test_fetch_all_pages_follows_next_token() {
        let mut server = Server::new();
        let first = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("end_date".into(), "2024-01-07".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data": [{"id": "1"}, {"id": "2"}], "next_token": "page-2"}"#)
            .expect(1)
            .create();
        let second = server
            .mock("GET", ENDPOINT)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("next_token".into(), "page-2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data": [{"id": "3"}], "next_token": ""}"#)
            .create();
        let f = fixture(&server);

        let items = f
            .client
            .fetch_all_pages(ENDPOINT, Some("2024-01-01"), Some("2024-01-07"), &[])
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        first.assert();
        second.assert();
    }

    #[test]
    fn test_fetch_all_pages_stops_without_token() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v2/usercollection/ring_configuration")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": [{"id": "ring"}], "next_token": null}"#)
            .expect(1)
            .create();
        let f = fixture(&server);

        let items = f.client.ring_configuration().unwrap();
        assert_eq!(items.len(), 1);
        mock.assert();
    }

    #[test]
    fn test_heart_rate_uses_datetime_params() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v2/usercollection/heartrate")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_datetime".into(), "2024-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("end_datetime".into(), "2024-01-02T23:59:59Z".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data": [{"bpm": 60}]}"#)
            .create();
        let f = fixture(&server);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let items = f
            .client
            .fetch_collection(DataType::HeartRate, start, end)
            .unwrap();
        assert_eq!(items.len(), 1);
        mock.assert();
    }

    #[test]
    fn test_identify() {
        let mut server = Server::new();
        server
            .mock("GET", PERSONAL_INFO_ENDPOINT)
            .match_header("authorization", "Bearer fresh-token")
            .with_status(200)
            .with_body(r#"{"id": "user-42", "age": 30}"#)
            .create();
        let f = fixture(&server);

        assert_eq!(f.client.identify("fresh-token").unwrap(), "user-42");
    }
}
