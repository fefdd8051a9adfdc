//! Configuration loading for the Oura client
//!
//! Supports loading OAuth application settings from (in order of priority):
//! 1. JSON file (~/.config/ringsync/oura-credentials.json)
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings filename in the ringsync config directory
const CREDENTIALS_FILE: &str = "oura-credentials.json";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";
pub const DEFAULT_API_BASE_URL: &str = "https://api.ouraring.com";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://cloud.ouraring.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.ouraring.com/oauth/token";
pub const DEFAULT_SYNC_DAYS_BACK: i64 = 90;
/// Upper bound for `sync_days_back` (about a century)
pub const MAX_SYNC_DAYS_BACK: i64 = 36_500;

/// Every scope the provider offers
pub const DEFAULT_SCOPES: [&str; 8] = [
    "email",
    "personal",
    "daily",
    "heartrate",
    "workout",
    "tag",
    "session",
    "spo2",
];

/// OAuth application and endpoint settings
#[derive(Debug, Clone, PartialEq)]
pub struct OuraSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    /// Window used by `sync --initial`
    pub sync_days_back: i64,
}

/// On-disk settings file format. Only the client credentials are required.
#[derive(Deserialize)]
struct SettingsFile {
    client_id: String,
    client_secret: String,
    redirect_uri: Option<String>,
    api_base_url: Option<String>,
    authorize_url: Option<String>,
    token_url: Option<String>,
    scopes: Option<Vec<String>>,
    sync_days_back: Option<i64>,
}

impl OuraSettings {
    /// Settings with the provider's public endpoints and the given client credentials
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            sync_days_back: DEFAULT_SYNC_DAYS_BACK,
        }
    }

    /// Load settings using the following priority:
    /// 1. JSON file (~/.config/ringsync/oura-credentials.json)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if ::config::config_exists(CREDENTIALS_FILE) {
            let file: SettingsFile = ::config::load_json(CREDENTIALS_FILE)?;
            return Self::from_settings_file(file);
        }

        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: SettingsFile = ::config::load_json_file(path)?;
        Self::from_settings_file(file)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SettingsFile =
            serde_json::from_str(json).context("Failed to parse settings JSON")?;
        Self::from_settings_file(file)
    }

    fn from_settings_file(file: SettingsFile) -> Result<Self> {
        let defaults = Self::new(file.client_id, file.client_secret);
        let sync_days_back = match file.sync_days_back {
            Some(days) => check_days_back(days)?,
            None => defaults.sync_days_back,
        };
        Ok(Self {
            redirect_uri: file.redirect_uri.unwrap_or(defaults.redirect_uri),
            api_base_url: file.api_base_url.unwrap_or(defaults.api_base_url),
            authorize_url: file.authorize_url.unwrap_or(defaults.authorize_url),
            token_url: file.token_url.unwrap_or(defaults.token_url),
            scopes: file.scopes.unwrap_or(defaults.scopes),
            sync_days_back,
            client_id: defaults.client_id,
            client_secret: defaults.client_secret,
        })
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_id = lookup("OURA_CLIENT_ID")
            .filter(|v| !v.is_empty())
            .context("OURA_CLIENT_ID environment variable not set")?;
        let client_secret = lookup("OURA_CLIENT_SECRET")
            .filter(|v| !v.is_empty())
            .context("OURA_CLIENT_SECRET environment variable not set")?;

        let mut settings = Self::new(client_id, client_secret);
        if let Some(v) = lookup("OURA_REDIRECT_URI") {
            settings.redirect_uri = v;
        }
        if let Some(v) = lookup("OURA_API_BASE_URL") {
            settings.api_base_url = v;
        }
        if let Some(v) = lookup("OURA_AUTHORIZE_URL") {
            settings.authorize_url = v;
        }
        if let Some(v) = lookup("OURA_TOKEN_URL") {
            settings.token_url = v;
        }
        if let Some(v) = lookup("OURA_SYNC_DAYS_BACK") {
            let days = v
                .parse()
                .with_context(|| format!("OURA_SYNC_DAYS_BACK is not a number: {v}"))?;
            settings.sync_days_back = check_days_back(days)?;
        }

        Ok(settings)
    }

    /// Scopes joined the way the authorization endpoint expects them
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Get the default settings file path (~/.config/ringsync/oura-credentials.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        ::config::config_path(CREDENTIALS_FILE)
    }

    /// Check if settings are available (file or env vars)
    pub fn is_available() -> bool {
        if ::config::config_exists(CREDENTIALS_FILE) {
            return true;
        }
        std::env::var("OURA_CLIENT_ID").is_ok() && std::env::var("OURA_CLIENT_SECRET").is_ok()
    }
}

fn check_days_back(days: i64) -> Result<i64> {
    if !(0..=MAX_SYNC_DAYS_BACK).contains(&days) {
        bail!("sync_days_back must be between 0 and {MAX_SYNC_DAYS_BACK}, got {days}");
    }
    Ok(days)
}
