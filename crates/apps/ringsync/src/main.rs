//! ringsync - Sync Oura ring data into a local database
//!
//! This is the main entry point for the ringsync command-line tool.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::error;
use oura::storage::{SqliteStore, TokenStore};
use oura::{OAuthManager, OuraSettings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod auth;
mod cli;
mod status;
mod sync;

use cli::{Cli, Commands};

const DB_FILE: &str = "ringsync.sqlite";

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Bootstrap config and data directories
    if let Err(e) = config::init() {
        error!("Failed to initialize ringsync directories: {}", e);
    }

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = Arc::new(SqliteStore::open(&db_path)?);

    match cli.command {
        Commands::Auth(args) => {
            let oauth = Arc::new(OAuthManager::new(load_settings()?, store));
            auth::run(oauth, &args)
        }
        Commands::Sync(args) => {
            let oauth = Arc::new(OAuthManager::new(load_settings()?, store.clone()));
            sync::run(oauth, store.as_ref(), &args)
        }
        Commands::Status(args) => status::run(store.as_ref(), &args),
    }
}

fn default_db_path() -> Result<PathBuf> {
    config::data_path(DB_FILE).context("Could not determine data directory")
}

fn load_settings() -> Result<OuraSettings> {
    OuraSettings::load().map_err(|e| {
        if let Some(path) = OuraSettings::default_settings_path() {
            error!(
                "To configure Oura access, either:\n\
                 1. Place your OAuth application settings at: {}\n\
                 2. Or set environment variables: OURA_CLIENT_ID and OURA_CLIENT_SECRET",
                path.display()
            );
        }
        e
    })
}

/// The requested account, or the first authorized one
pub(crate) fn resolve_account(store: &dyn TokenStore, requested: Option<&str>) -> Result<String> {
    if let Some(account_id) = requested {
        if store.load_credential(account_id)?.is_none() {
            bail!("No credentials stored for account {account_id}; run `ringsync auth` first");
        }
        return Ok(account_id.to_string());
    }

    match store.list_accounts()?.into_iter().next() {
        Some(account_id) => Ok(account_id),
        None => bail!("No authorized account found; run `ringsync auth` first"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oura::models::Credential;
    use oura::storage::InMemoryStore;

    #[test]
    fn test_resolve_account_defaults_to_first() {
        let store = InMemoryStore::new();
        assert!(resolve_account(&store, None).is_err());

        store
            .upsert_credential(&Credential::new("first", "a", "r"))
            .unwrap();
        store
            .upsert_credential(&Credential::new("second", "b", "s"))
            .unwrap();

        assert_eq!(resolve_account(&store, None).unwrap(), "first");
        assert_eq!(resolve_account(&store, Some("second")).unwrap(), "second");
        assert!(resolve_account(&store, Some("third")).is_err());
    }
}
