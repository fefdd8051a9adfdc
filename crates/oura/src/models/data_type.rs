//! Catalogue of the provider's collection endpoints

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A collection the API serves under `/v2/usercollection/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    DailyActivity,
    DailySleep,
    DailyReadiness,
    DailySpo2,
    DailyStress,
    DailyResilience,
    DailyCardiovascularAge,
    HeartRate,
    Sleep,
    SleepTime,
    Workout,
    Session,
    Tag,
    EnhancedTag,
    RestModePeriod,
    RingConfiguration,
    Vo2Max,
}

/// How a collection is filtered in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// `start_date` / `end_date` (YYYY-MM-DD)
    Date,
    /// `start_datetime` / `end_datetime` (RFC 3339)
    DateTime,
    /// No time filter
    None,
}

impl DataType {
    /// Every known collection
    pub const ALL: [DataType; 17] = [
        DataType::DailyActivity,
        DataType::DailySleep,
        DataType::DailyReadiness,
        DataType::DailySpo2,
        DataType::DailyStress,
        DataType::DailyResilience,
        DataType::DailyCardiovascularAge,
        DataType::HeartRate,
        DataType::Sleep,
        DataType::SleepTime,
        DataType::Workout,
        DataType::Session,
        DataType::Tag,
        DataType::EnhancedTag,
        DataType::RestModePeriod,
        DataType::RingConfiguration,
        DataType::Vo2Max,
    ];

    /// The daily summary collections (`--all` in the CLI)
    pub const DAILY: [DataType; 7] = [
        DataType::DailyActivity,
        DataType::DailySleep,
        DataType::DailyReadiness,
        DataType::DailySpo2,
        DataType::DailyStress,
        DataType::DailyResilience,
        DataType::DailyCardiovascularAge,
    ];

    /// Synced when no types are requested explicitly
    pub const DEFAULT_SYNC: [DataType; 3] = [
        DataType::DailyActivity,
        DataType::DailySleep,
        DataType::DailyReadiness,
    ];

    /// Collection name as used in the API path
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::DailyActivity => "daily_activity",
            DataType::DailySleep => "daily_sleep",
            DataType::DailyReadiness => "daily_readiness",
            DataType::DailySpo2 => "daily_spo2",
            DataType::DailyStress => "daily_stress",
            DataType::DailyResilience => "daily_resilience",
            DataType::DailyCardiovascularAge => "daily_cardiovascular_age",
            DataType::HeartRate => "heartrate",
            DataType::Sleep => "sleep",
            DataType::SleepTime => "sleep_time",
            DataType::Workout => "workout",
            DataType::Session => "session",
            DataType::Tag => "tag",
            DataType::EnhancedTag => "enhanced_tag",
            DataType::RestModePeriod => "rest_mode_period",
            DataType::RingConfiguration => "ring_configuration",
            // The API really does spell it with a capital O
            DataType::Vo2Max => "vO2_max",
        }
    }

    /// Endpoint path relative to the API base URL
    pub fn endpoint(&self) -> String {
        format!("/v2/usercollection/{}", self.as_str())
    }

    /// Which query parameters bound this collection in time
    pub fn range_kind(&self) -> RangeKind {
        match self {
            DataType::HeartRate => RangeKind::DateTime,
            DataType::RingConfiguration => RangeKind::None,
            _ => RangeKind::Date,
        }
    }

    /// Whether records of this type are mapped and stored in typed tables
    pub fn has_mapper(&self) -> bool {
        matches!(
            self,
            DataType::DailyActivity
                | DataType::DailySleep
                | DataType::DailyReadiness
                | DataType::DailySpo2
                | DataType::DailyStress
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        match DataType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
        {
            Some(t) => Ok(*t),
            None => bail!("Unknown data type: {wanted}"),
        }
    }
}

/// Parse a comma-separated list of data types (e.g. `daily_sleep,daily_stress`)
pub fn parse_data_types(list: &str) -> Result<Vec<DataType>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(DataType::from_str)
        .collect()
}
