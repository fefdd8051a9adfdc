//! `ringsync sync`: fetch data and store it locally

use anyhow::{Result, bail};
use chrono::Local;
use log::{error, info};
use oura::models::{DataType, parse_data_types};
use oura::storage::RecordStore;
use oura::sync::{SyncOptions, SyncReport, resolve_date_range, sync_daily_data, sync_personal_info};
use oura::{OAuthManager, OuraClient};
use std::sync::Arc;

use crate::cli::SyncArgs;

pub fn run(oauth: Arc<OAuthManager>, store: &dyn RecordStore, args: &SyncArgs) -> Result<()> {
    let account_id = crate::resolve_account(oauth.store().as_ref(), args.account.as_deref())?;
    info!("Syncing data for user: {}", account_id);

    let (start, end) = resolve_date_range(
        args.initial,
        args.start_date,
        args.end_date,
        Local::now().date_naive(),
        oauth.settings().sync_days_back,
    )?;
    info!("Date range: {} to {}", start, end);

    let data_types = select_data_types(args)?;
    info!(
        "Syncing data types: {}",
        data_types
            .iter()
            .map(DataType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let client = OuraClient::new(oauth, account_id.clone());

    if args.personal_info
        && let Err(e) = sync_personal_info(&client, store, &account_id)
    {
        error!("Failed to sync personal info: {:#}", e);
    }

    let mut options = SyncOptions::new(start, end, data_types);
    if let Some(dir) = &args.export_dir {
        options = options.with_export_dir(dir);
    }

    let report = sync_daily_data(&client, store, &account_id, &options);
    print_summary(&report);

    if report.all_failed() {
        bail!("Every data type failed to sync");
    }
    Ok(())
}

fn select_data_types(args: &SyncArgs) -> Result<Vec<DataType>> {
    if args.all {
        return Ok(DataType::DAILY.to_vec());
    }
    match &args.types {
        Some(types) => parse_data_types(types),
        None => Ok(DataType::DEFAULT_SYNC.to_vec()),
    }
}

fn print_summary(report: &SyncReport) {
    println!("\n=== Sync Summary ===");
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!(
                "  {:<26} fetched {:>5}  new {:>5}  updated {:>5}  skipped {:>3}",
                outcome.data_type.as_str(),
                outcome.fetched,
                outcome.inserted,
                outcome.updated,
                outcome.skipped
            ),
            Some(err) => println!("  {:<26} FAILED: {}", outcome.data_type.as_str(), err),
        }
    }
    println!(
        "Fetched {} items ({} new, {} updated) in {:.1}s",
        report.total_fetched(),
        report.total_inserted(),
        report.total_updated(),
        report.duration_ms as f64 / 1000.0
    );
}
