//! Sync engine for fetching and storing wearable data
//!
//! Upserts are keyed by provider record id, so a run can be repeated over
//! the same range without creating duplicates.

mod daily;
mod range;

pub use daily::{DataTypeOutcome, SyncOptions, SyncReport, sync_daily_data, sync_personal_info};
pub use range::{DEFAULT_WINDOW_DAYS, resolve_date_range};
