//! Daily data sync implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::api::{OuraClient, map_personal_info, map_record};
use crate::models::{DataType, Record, UpsertOutcome};
use crate::storage::RecordStore;

/// What to sync in one run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
    pub data_types: Vec<DataType>,
    /// Write each fetched collection as pretty JSON under this directory
    pub export_dir: Option<PathBuf>,
}

impl SyncOptions {
    pub fn new(start: NaiveDate, end: NaiveDate, data_types: Vec<DataType>) -> Self {
        Self {
            start,
            end,
            data_types,
            export_dir: None,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }
}

/// Result of syncing one data type
#[derive(Debug, Clone)]
pub struct DataTypeOutcome {
    pub data_type: DataType,
    /// Items returned by the API
    pub fetched: usize,
    /// New records stored
    pub inserted: usize,
    /// Existing records overwritten
    pub updated: usize,
    /// Items that could not be mapped to a record
    pub skipped: usize,
    /// Where the raw items were exported, if requested
    pub export_path: Option<PathBuf>,
    /// Set when the data type failed as a whole
    pub error: Option<String>,
}

impl DataTypeOutcome {
    fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            fetched: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            export_path: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Statistics from a sync run
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    /// One entry per requested data type, in request order
    pub outcomes: Vec<DataTypeOutcome>,
    /// Duration of the sync operation
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn failed(&self) -> impl Iterator<Item = &DataTypeOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// True when at least one type was requested and none succeeded
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.succeeded())
    }

    pub fn total_fetched(&self) -> usize {
        self.outcomes.iter().map(|o| o.fetched).sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.inserted).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.outcomes.iter().map(|o| o.updated).sum()
    }
}

/// Fetch and store the account holder's profile
pub fn sync_personal_info(
    client: &OuraClient,
    store: &dyn RecordStore,
    user_id: &str,
) -> Result<UpsertOutcome> {
    info!("Syncing personal info...");
    let data = client.personal_info()?;
    let info = map_personal_info(&data, user_id)?;
    let outcome = store.upsert_record(&Record::PersonalInfo(info))?;
    match outcome {
        UpsertOutcome::Inserted => info!("Created personal info record"),
        UpsertOutcome::Updated => info!("Updated personal info"),
    }
    Ok(outcome)
}

/// Sync each requested data type over the option's date range.
///
/// A failing data type is logged and recorded in the report; the remaining
/// types still run.
pub fn sync_daily_data(
    client: &OuraClient,
    store: &dyn RecordStore,
    user_id: &str,
    options: &SyncOptions,
) -> SyncReport {
    let start = Instant::now();
    let mut report = SyncReport::default();

    for &data_type in &options.data_types {
        info!("Syncing {}...", data_type);
        let mut outcome = DataTypeOutcome::new(data_type);

        if let Err(e) = sync_data_type(client, store, user_id, options, &mut outcome) {
            error!("Failed to sync {}: {:#}", data_type, e);
            outcome.error = Some(format!("{e:#}"));
        }
        report.outcomes.push(outcome);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}

fn sync_data_type(
    client: &OuraClient,
    store: &dyn RecordStore,
    user_id: &str,
    options: &SyncOptions,
    outcome: &mut DataTypeOutcome,
) -> Result<()> {
    let data_type = outcome.data_type;
    let items = client.fetch_collection(data_type, options.start, options.end)?;
    outcome.fetched = items.len();
    info!("Retrieved {} {} records", items.len(), data_type);

    if data_type.has_mapper() {
        for item in &items {
            let Some(mapped) = map_record(data_type, item, user_id) else {
                break;
            };
            let record = match mapped {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping {} record: {:#}", data_type, e);
                    outcome.skipped += 1;
                    continue;
                }
            };
            match store.upsert_record(&record)? {
                UpsertOutcome::Inserted => outcome.inserted += 1,
                UpsertOutcome::Updated => outcome.updated += 1,
            }
        }
        info!(
            "Saved {} new records, updated {} records to database",
            outcome.inserted, outcome.updated
        );
    }

    if let Some(dir) = &options.export_dir {
        let path = export_path(dir, data_type, options.start, options.end);
        ::config::save_json_file(&path, &items)
            .with_context(|| format!("Failed to export {data_type}"))?;
        info!("Saved to {}", path.display());
        outcome.export_path = Some(path);
    }

    Ok(())
}

/// `<dir>/<type>/<start>_to_<end>.json`
fn export_path(dir: &Path, data_type: DataType, start: NaiveDate, end: NaiveDate) -> PathBuf {
    dir.join(data_type.as_str())
        .join(format!("{}_to_{}.json", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")))
}
