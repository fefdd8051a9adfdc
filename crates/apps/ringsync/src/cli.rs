//! CLI argument definitions for ringsync.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Sync Oura ring data into a local SQLite database
#[derive(Parser, Debug)]
#[command(name = "ringsync", version, about = "Sync Oura ring data into a local database")]
pub struct Cli {
    /// Database file (defaults to the ringsync data directory)
    #[arg(long, global = true, value_name = "PATH", env = "RINGSYNC_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize access to an Oura account
    Auth(AuthArgs),
    /// Fetch data and store it locally
    Sync(SyncArgs),
    /// Show stored accounts and token state
    Status(StatusArgs),
}

/// Arguments for `ringsync auth`.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,
}

/// Arguments for `ringsync sync`.
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Initial backfill (sync_days_back days up to today)
    #[arg(long)]
    pub initial: bool,

    /// Comma-separated data types to sync
    #[arg(long, value_name = "TYPES", conflicts_with = "all")]
    pub types: Option<String>,

    /// Sync all daily summary types
    #[arg(long)]
    pub all: bool,

    /// Also sync personal info
    #[arg(long)]
    pub personal_info: bool,

    /// Write fetched data as JSON under this directory
    #[arg(long, value_name = "PATH")]
    pub export_dir: Option<PathBuf>,

    /// Account to sync (defaults to the first authorized account)
    #[arg(long, value_name = "ID")]
    pub account: Option<String>,
}

/// Arguments for `ringsync status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Only show this account
    #[arg(long, value_name = "ID")]
    pub account: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::parse_from([
            "ringsync",
            "--db",
            "/tmp/x.sqlite",
            "sync",
            "--start-date",
            "2024-01-01",
            "--types",
            "daily_sleep,daily_stress",
            "--personal-info",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.sqlite")));
        let Commands::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(args.end_date.is_none());
        assert_eq!(args.types.as_deref(), Some("daily_sleep,daily_stress"));
        assert!(args.personal_info);
        assert!(!args.initial);
    }

    #[test]
    fn test_types_conflict_with_all() {
        let result = Cli::try_parse_from(["ringsync", "sync", "--all", "--types", "daily_sleep"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result = Cli::try_parse_from(["ringsync", "sync", "--end-date", "01/02/2024"]);
        assert!(result.is_err());
    }
}
