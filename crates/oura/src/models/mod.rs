//! Domain models for credentials and synced records

mod credential;
mod data_type;
mod records;

pub use credential::{Credential, DEFAULT_TOKEN_TYPE, parse_stored_timestamp};
pub use data_type::{DataType, RangeKind, parse_data_types};
pub use records::{
    DailyActivity, DailyReadiness, DailySleep, DailySpo2, DailyStress, PersonalInfo, Record,
    RecordKind, UpsertOutcome,
};
