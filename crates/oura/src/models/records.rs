//! Typed daily records stored in the local database

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Daily activity summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    pub score: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub active_calories: Option<i64>,
    pub average_met_minutes: Option<f64>,
    pub equivalent_walking_distance: Option<i64>,
    pub high_activity_met_minutes: Option<i64>,
    pub high_activity_time: Option<i64>,
    pub inactivity_alerts: Option<i64>,
    pub low_activity_met_minutes: Option<i64>,
    pub low_activity_time: Option<i64>,
    pub medium_activity_met_minutes: Option<i64>,
    pub medium_activity_time: Option<i64>,
    pub meters_to_target: Option<i64>,
    pub non_wear_time: Option<i64>,
    pub resting_time: Option<i64>,
    pub sedentary_met_minutes: Option<i64>,
    pub sedentary_time: Option<i64>,
    pub steps: Option<i64>,
    pub target_calories: Option<i64>,
    pub target_meters: Option<i64>,
    pub total_calories: Option<i64>,
    /// One activity class digit per 5 minutes of the day
    pub class_5_min: Option<String>,
    /// Seconds between MET samples
    pub met_interval: Option<f64>,
    pub meet_daily_targets: Option<i64>,
    pub move_every_hour: Option<i64>,
    pub recovery_time: Option<i64>,
    pub stay_active: Option<i64>,
    pub training_frequency: Option<i64>,
    pub training_volume: Option<i64>,
    pub raw_data: Value,
}

/// Daily sleep score and contributors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySleep {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    pub score: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub deep_sleep: Option<i64>,
    pub efficiency: Option<i64>,
    pub latency: Option<i64>,
    pub rem_sleep: Option<i64>,
    pub restfulness: Option<i64>,
    pub timing: Option<i64>,
    pub total_sleep: Option<i64>,
    pub raw_data: Value,
}

/// Daily readiness score and contributors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReadiness {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    pub score: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub temperature_deviation: Option<f64>,
    pub temperature_trend_deviation: Option<f64>,
    pub activity_balance: Option<i64>,
    pub body_temperature: Option<i64>,
    pub hrv_balance: Option<i64>,
    pub previous_day_activity: Option<i64>,
    pub previous_night: Option<i64>,
    pub recovery_index: Option<i64>,
    pub resting_heart_rate: Option<i64>,
    pub sleep_balance: Option<i64>,
    pub sleep_regularity: Option<i64>,
    pub raw_data: Value,
}

/// Daily blood oxygen summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpo2 {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    pub breathing_disturbance_index: Option<i64>,
    pub spo2_percentage_average: Option<f64>,
    pub raw_data: Value,
}

/// Daily stress summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStress {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    /// "restored", "normal" or "stressful"
    pub day_summary: Option<String>,
    /// Seconds spent in high recovery
    pub recovery_high: Option<i64>,
    /// Seconds spent in high stress
    pub stress_high: Option<i64>,
    pub raw_data: Value,
}

/// Account holder profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub id: String,
    pub user_id: String,
    pub age: Option<i64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub biological_sex: Option<String>,
    pub email: Option<String>,
    pub raw_data: Value,
}

/// Discriminant for [`Record`], one per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    DailyActivity,
    DailySleep,
    DailyReadiness,
    DailySpo2,
    DailyStress,
    PersonalInfo,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::DailyActivity,
        RecordKind::DailySleep,
        RecordKind::DailyReadiness,
        RecordKind::DailySpo2,
        RecordKind::DailyStress,
        RecordKind::PersonalInfo,
    ];

    /// Table name in the SQLite store
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::DailyActivity => "daily_activity",
            RecordKind::DailySleep => "daily_sleep",
            RecordKind::DailyReadiness => "daily_readiness",
            RecordKind::DailySpo2 => "daily_spo2",
            RecordKind::DailyStress => "daily_stress",
            RecordKind::PersonalInfo => "personal_info",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Any typed record the store can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    DailyActivity(DailyActivity),
    DailySleep(DailySleep),
    DailyReadiness(DailyReadiness),
    DailySpo2(DailySpo2),
    DailyStress(DailyStress),
    PersonalInfo(PersonalInfo),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::DailyActivity(_) => RecordKind::DailyActivity,
            Record::DailySleep(_) => RecordKind::DailySleep,
            Record::DailyReadiness(_) => RecordKind::DailyReadiness,
            Record::DailySpo2(_) => RecordKind::DailySpo2,
            Record::DailyStress(_) => RecordKind::DailyStress,
            Record::PersonalInfo(_) => RecordKind::PersonalInfo,
        }
    }

    /// Provider record id
    pub fn id(&self) -> &str {
        match self {
            Record::DailyActivity(r) => &r.id,
            Record::DailySleep(r) => &r.id,
            Record::DailyReadiness(r) => &r.id,
            Record::DailySpo2(r) => &r.id,
            Record::DailyStress(r) => &r.id,
            Record::PersonalInfo(r) => &r.id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Record::DailyActivity(r) => &r.user_id,
            Record::DailySleep(r) => &r.user_id,
            Record::DailyReadiness(r) => &r.user_id,
            Record::DailySpo2(r) => &r.user_id,
            Record::DailyStress(r) => &r.user_id,
            Record::PersonalInfo(r) => &r.user_id,
        }
    }
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
