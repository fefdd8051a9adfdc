//! Conversion from API JSON payloads to typed records
//!
//! Nested objects (`contributors`, `met`, `spo2_percentage`) are optional;
//! when absent their fields map to `None`. The full payload is always kept
//! as `raw_data`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{
    DailyActivity, DailyReadiness, DailySleep, DailySpo2, DailyStress, DataType, PersonalInfo,
    Record,
};

/// Map one collection item to a typed record.
///
/// Returns `None` when `data_type` has no typed table.
pub fn map_record(data_type: DataType, raw: &Value, user_id: &str) -> Option<Result<Record>> {
    let record = match data_type {
        DataType::DailyActivity => map_daily_activity(raw, user_id).map(Record::DailyActivity),
        DataType::DailySleep => map_daily_sleep(raw, user_id).map(Record::DailySleep),
        DataType::DailyReadiness => map_daily_readiness(raw, user_id).map(Record::DailyReadiness),
        DataType::DailySpo2 => map_daily_spo2(raw, user_id).map(Record::DailySpo2),
        DataType::DailyStress => map_daily_stress(raw, user_id).map(Record::DailyStress),
        _ => return None,
    };
    Some(record)
}

pub fn map_daily_activity(raw: &Value, user_id: &str) -> Result<DailyActivity> {
    let p: DailyActivityPayload = parse_payload(raw, DataType::DailyActivity)?;
    let c = p.contributors.unwrap_or_default();
    let met = p.met.unwrap_or_default();

    Ok(DailyActivity {
        id: p.id,
        user_id: user_id.to_string(),
        day: parse_day(&p.day)?,
        score: p.score,
        timestamp: parse_timestamp(&p.timestamp)?,
        active_calories: p.active_calories,
        average_met_minutes: p.average_met_minutes,
        equivalent_walking_distance: p.equivalent_walking_distance,
        high_activity_met_minutes: p.high_activity_met_minutes,
        high_activity_time: p.high_activity_time,
        inactivity_alerts: p.inactivity_alerts,
        low_activity_met_minutes: p.low_activity_met_minutes,
        low_activity_time: p.low_activity_time,
        medium_activity_met_minutes: p.medium_activity_met_minutes,
        medium_activity_time: p.medium_activity_time,
        meters_to_target: p.meters_to_target,
        non_wear_time: p.non_wear_time,
        resting_time: p.resting_time,
        sedentary_met_minutes: p.sedentary_met_minutes,
        sedentary_time: p.sedentary_time,
        steps: p.steps,
        target_calories: p.target_calories,
        target_meters: p.target_meters,
        total_calories: p.total_calories,
        class_5_min: p.class_5_min,
        met_interval: met.interval,
        meet_daily_targets: c.meet_daily_targets,
        move_every_hour: c.move_every_hour,
        recovery_time: c.recovery_time,
        stay_active: c.stay_active,
        training_frequency: c.training_frequency,
        training_volume: c.training_volume,
        raw_data: raw.clone(),
    })
}

pub fn map_daily_sleep(raw: &Value, user_id: &str) -> Result<DailySleep> {
    let p: DailySleepPayload = parse_payload(raw, DataType::DailySleep)?;
    let c = p.contributors.unwrap_or_default();

    Ok(DailySleep {
        id: p.id,
        user_id: user_id.to_string(),
        day: parse_day(&p.day)?,
        score: p.score,
        timestamp: parse_timestamp(&p.timestamp)?,
        deep_sleep: c.deep_sleep,
        efficiency: c.efficiency,
        latency: c.latency,
        rem_sleep: c.rem_sleep,
        restfulness: c.restfulness,
        timing: c.timing,
        total_sleep: c.total_sleep,
        raw_data: raw.clone(),
    })
}

pub fn map_daily_readiness(raw: &Value, user_id: &str) -> Result<DailyReadiness> {
    let p: DailyReadinessPayload = parse_payload(raw, DataType::DailyReadiness)?;
    let c = p.contributors.unwrap_or_default();

    Ok(DailyReadiness {
        id: p.id,
        user_id: user_id.to_string(),
        day: parse_day(&p.day)?,
        score: p.score,
        timestamp: parse_timestamp(&p.timestamp)?,
        temperature_deviation: p.temperature_deviation,
        temperature_trend_deviation: p.temperature_trend_deviation,
        activity_balance: c.activity_balance,
        body_temperature: c.body_temperature,
        hrv_balance: c.hrv_balance,
        previous_day_activity: c.previous_day_activity,
        previous_night: c.previous_night,
        recovery_index: c.recovery_index,
        resting_heart_rate: c.resting_heart_rate,
        sleep_balance: c.sleep_balance,
        sleep_regularity: c.sleep_regularity,
        raw_data: raw.clone(),
    })
}

pub fn map_daily_spo2(raw: &Value, user_id: &str) -> Result<DailySpo2> {
    let p: DailySpo2Payload = parse_payload(raw, DataType::DailySpo2)?;

    Ok(DailySpo2 {
        id: p.id,
        user_id: user_id.to_string(),
        day: parse_day(&p.day)?,
        breathing_disturbance_index: p.breathing_disturbance_index,
        spo2_percentage_average: p.spo2_percentage.and_then(|s| s.average),
        raw_data: raw.clone(),
    })
}

pub fn map_daily_stress(raw: &Value, user_id: &str) -> Result<DailyStress> {
    let p: DailyStressPayload = parse_payload(raw, DataType::DailyStress)?;

    Ok(DailyStress {
        id: p.id,
        user_id: user_id.to_string(),
        day: parse_day(&p.day)?,
        day_summary: p.day_summary,
        recovery_high: p.recovery_high,
        stress_high: p.stress_high,
        raw_data: raw.clone(),
    })
}

/// Map the personal info object. The record id falls back to `user_id`.
pub fn map_personal_info(raw: &Value, user_id: &str) -> Result<PersonalInfo> {
    let p: PersonalInfoPayload =
        serde_json::from_value(raw.clone()).context("Malformed personal_info payload")?;

    Ok(PersonalInfo {
        id: p.id.unwrap_or_else(|| user_id.to_string()),
        user_id: user_id.to_string(),
        age: p.age,
        weight: p.weight,
        height: p.height,
        biological_sex: p.biological_sex,
        email: p.email,
        raw_data: raw.clone(),
    })
}

fn parse_payload<T: DeserializeOwned>(raw: &Value, data_type: DataType) -> Result<T> {
    serde_json::from_value(raw.clone()).with_context(|| {
        let id = raw.get("id").and_then(Value::as_str).unwrap_or("<no id>");
        format!("Malformed {data_type} record {id}")
    })
}

fn parse_day(day: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d").with_context(|| format!("Invalid day: {day}"))
}

/// RFC 3339 with any offset, normalized to UTC
fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp: {ts}"))
}

// === Payload shapes ===

#[derive(Deserialize)]
struct DailyActivityPayload {
    id: String,
    day: String,
    score: Option<i64>,
    timestamp: String,
    active_calories: Option<i64>,
    average_met_minutes: Option<f64>,
    equivalent_walking_distance: Option<i64>,
    high_activity_met_minutes: Option<i64>,
    high_activity_time: Option<i64>,
    inactivity_alerts: Option<i64>,
    low_activity_met_minutes: Option<i64>,
    low_activity_time: Option<i64>,
    medium_activity_met_minutes: Option<i64>,
    medium_activity_time: Option<i64>,
    meters_to_target: Option<i64>,
    non_wear_time: Option<i64>,
    resting_time: Option<i64>,
    sedentary_met_minutes: Option<i64>,
    sedentary_time: Option<i64>,
    steps: Option<i64>,
    target_calories: Option<i64>,
    target_meters: Option<i64>,
    total_calories: Option<i64>,
    class_5_min: Option<String>,
    met: Option<MetSamples>,
    contributors: Option<ActivityContributors>,
}

#[derive(Deserialize, Default)]
struct MetSamples {
    interval: Option<f64>,
}

#[derive(Deserialize, Default)]
struct ActivityContributors {
    meet_daily_targets: Option<i64>,
    move_every_hour: Option<i64>,
    recovery_time: Option<i64>,
    stay_active: Option<i64>,
    training_frequency: Option<i64>,
    training_volume: Option<i64>,
}

#[derive(Deserialize)]
struct DailySleepPayload {
    id: String,
    day: String,
    score: Option<i64>,
    timestamp: String,
    contributors: Option<SleepContributors>,
}

#[derive(Deserialize, Default)]
struct SleepContributors {
    deep_sleep: Option<i64>,
    efficiency: Option<i64>,
    latency: Option<i64>,
    rem_sleep: Option<i64>,
    restfulness: Option<i64>,
    timing: Option<i64>,
    total_sleep: Option<i64>,
}

#[derive(Deserialize)]
struct DailyReadinessPayload {
    id: String,
    day: String,
    score: Option<i64>,
    timestamp: String,
    temperature_deviation: Option<f64>,
    temperature_trend_deviation: Option<f64>,
    contributors: Option<ReadinessContributors>,
}

#[derive(Deserialize, Default)]
struct ReadinessContributors {
    activity_balance: Option<i64>,
    body_temperature: Option<i64>,
    hrv_balance: Option<i64>,
    previous_day_activity: Option<i64>,
    previous_night: Option<i64>,
    recovery_index: Option<i64>,
    resting_heart_rate: Option<i64>,
    sleep_balance: Option<i64>,
    sleep_regularity: Option<i64>,
}

#[derive(Deserialize)]
struct DailySpo2Payload {
    id: String,
    day: String,
    breathing_disturbance_index: Option<i64>,
    spo2_percentage: Option<Spo2Percentage>,
}

#[derive(Deserialize)]
struct Spo2Percentage {
    average: Option<f64>,
}

#[derive(Deserialize)]
struct DailyStressPayload {
    id: String,
    day: String,
    day_summary: Option<String>,
    recovery_high: Option<i64>,
    stress_high: Option<i64>,
}

#[derive(Deserialize)]
struct PersonalInfoPayload {
    id: Option<String>,
    age: Option<i64>,
    weight: Option<f64>,
    height: Option<f64>,
    biological_sex: Option<String>,
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_daily_sleep() {
        let raw = json!({
            "id": "sleep-1",
            "day": "2024-01-02",
            "score": 82,
            "timestamp": "2024-01-02T00:00:00+02:00",
            "contributors": {
                "deep_sleep": 90,
                "efficiency": 85,
                "latency": 70,
                "rem_sleep": 60,
                "restfulness": 75,
                "timing": 95,
                "total_sleep": 80
            }
        });

        let sleep = map_daily_sleep(&raw, "user-1").unwrap();
        assert_eq!(sleep.id, "sleep-1");
        assert_eq!(sleep.user_id, "user-1");
        assert_eq!(sleep.day, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(sleep.score, Some(82));
        assert_eq!(sleep.timestamp.to_rfc3339(), "2024-01-01T22:00:00+00:00");
        assert_eq!(sleep.deep_sleep, Some(90));
        assert_eq!(sleep.total_sleep, Some(80));
        assert_eq!(sleep.raw_data, raw);
    }

    #[test]
    fn test_map_sleep_without_contributors() {
        let raw = json!({
            "id": "sleep-2",
            "day": "2024-01-03",
            "score": null,
            "timestamp": "2024-01-03T00:00:00Z"
        });

        let sleep = map_daily_sleep(&raw, "user-1").unwrap();
        assert!(sleep.score.is_none());
        assert!(sleep.deep_sleep.is_none());
        assert!(sleep.efficiency.is_none());
    }

    #[test]
    fn test_map_daily_activity_nested_fields() {
        let raw = json!({
            "id": "act-1",
            "day": "2024-01-02",
            "score": 77,
            "timestamp": "2024-01-02T04:00:00-05:00",
            "active_calories": 450,
            "average_met_minutes": 1.65625,
            "steps": 9876,
            "class_5_min": "0001112223",
            "met": { "interval": 60.0, "items": [0.9, 1.2], "timestamp": "2024-01-02T04:00:00-05:00" },
            "contributors": {
                "meet_daily_targets": 60,
                "move_every_hour": 100,
                "recovery_time": 100,
                "stay_active": 80,
                "training_frequency": 71,
                "training_volume": 98
            }
        });

        let activity = map_daily_activity(&raw, "user-1").unwrap();
        assert_eq!(activity.steps, Some(9876));
        assert_eq!(activity.average_met_minutes, Some(1.65625));
        assert_eq!(activity.met_interval, Some(60.0));
        assert_eq!(activity.training_volume, Some(98));
        assert_eq!(activity.class_5_min.as_deref(), Some("0001112223"));
        assert_eq!(activity.timestamp.to_rfc3339(), "2024-01-02T09:00:00+00:00");
        assert!(activity.total_calories.is_none());
    }

    #[test]
    fn test_map_readiness_and_spo2_and_stress() {
        let readiness = map_daily_readiness(
            &json!({
                "id": "r1",
                "day": "2024-01-02",
                "score": 88,
                "timestamp": "2024-01-02T00:00:00+00:00",
                "temperature_deviation": -0.12,
                "contributors": { "hrv_balance": 77, "sleep_regularity": null }
            }),
            "user-1",
        )
        .unwrap();
        assert_eq!(readiness.temperature_deviation, Some(-0.12));
        assert!(readiness.temperature_trend_deviation.is_none());
        assert_eq!(readiness.hrv_balance, Some(77));
        assert!(readiness.sleep_regularity.is_none());

        let spo2 = map_daily_spo2(
            &json!({
                "id": "o1",
                "day": "2024-01-02",
                "breathing_disturbance_index": 3,
                "spo2_percentage": { "average": 96.5 }
            }),
            "user-1",
        )
        .unwrap();
        assert_eq!(spo2.spo2_percentage_average, Some(96.5));

        let no_average = map_daily_spo2(
            &json!({ "id": "o2", "day": "2024-01-03", "spo2_percentage": null }),
            "user-1",
        )
        .unwrap();
        assert!(no_average.spo2_percentage_average.is_none());

        let stress = map_daily_stress(
            &json!({
                "id": "st1",
                "day": "2024-01-02",
                "day_summary": "restored",
                "recovery_high": 5400,
                "stress_high": 900
            }),
            "user-1",
        )
        .unwrap();
        assert_eq!(stress.day_summary.as_deref(), Some("restored"));
        assert_eq!(stress.stress_high, Some(900));
    }

    #[test]
    fn test_map_record_dispatch() {
        let raw = json!({ "id": "w1", "day": "2024-01-02" });
        assert!(map_record(DataType::Workout, &raw, "user-1").is_none());

        let stress = json!({ "id": "st1", "day": "2024-01-02" });
        let record = map_record(DataType::DailyStress, &stress, "user-1")
            .unwrap()
            .unwrap();
        assert_eq!(record.id(), "st1");
    }

    #[test]
    fn test_malformed_record() {
        let raw = json!({ "id": "sleep-3", "day": "not-a-day", "timestamp": "2024-01-03T00:00:00Z" });
        let err = map_daily_sleep(&raw, "user-1").unwrap_err();
        assert!(err.to_string().contains("Invalid day"));

        let missing_id = json!({ "day": "2024-01-03", "timestamp": "2024-01-03T00:00:00Z" });
        assert!(map_record(DataType::DailySleep, &missing_id, "user-1").unwrap().is_err());
    }

    #[test]
    fn test_map_personal_info() {
        let raw = json!({
            "id": "user-1",
            "age": 34,
            "weight": 70.5,
            "height": 1.78,
            "biological_sex": "female",
            "email": "me@example.com"
        });
        let info = map_personal_info(&raw, "user-1").unwrap();
        assert_eq!(info.age, Some(34));
        assert_eq!(info.email.as_deref(), Some("me@example.com"));

        let anonymous = map_personal_info(&json!({ "age": 40 }), "user-9").unwrap();
        assert_eq!(anonymous.id, "user-9");
    }
}
