//! SQLite-backed token and record storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use rusqlite_migration::{M, Migrations};
use serde_json::Value;

use super::traits::{RecordStore, TokenStore};
use crate::models::{
    Credential, DailyActivity, DailyReadiness, DailySleep, DailySpo2, DailyStress, PersonalInfo,
    Record, RecordKind, UpsertOutcome, parse_stored_timestamp,
};

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: OAuth credentials
        M::up(
            r#"
            CREATE TABLE oauth_tokens (
                account_id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                token_type TEXT NOT NULL DEFAULT 'Bearer',
                expires_at TEXT,
                granted_scopes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL
            );
            "#,
        ),
        // Migration 2: typed daily records, raw payloads are zstd-compressed JSON
        M::up(
            r#"
            CREATE TABLE personal_info (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                age INTEGER,
                weight REAL,
                height REAL,
                biological_sex TEXT,
                email TEXT,
                raw_data BLOB NOT NULL
            );

            CREATE TABLE daily_activity (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                score INTEGER,
                timestamp TEXT NOT NULL,
                active_calories INTEGER,
                average_met_minutes REAL,
                equivalent_walking_distance INTEGER,
                high_activity_met_minutes INTEGER,
                high_activity_time INTEGER,
                inactivity_alerts INTEGER,
                low_activity_met_minutes INTEGER,
                low_activity_time INTEGER,
                medium_activity_met_minutes INTEGER,
                medium_activity_time INTEGER,
                meters_to_target INTEGER,
                non_wear_time INTEGER,
                resting_time INTEGER,
                sedentary_met_minutes INTEGER,
                sedentary_time INTEGER,
                steps INTEGER,
                target_calories INTEGER,
                target_meters INTEGER,
                total_calories INTEGER,
                class_5_min TEXT,
                met_interval REAL,
                meet_daily_targets INTEGER,
                move_every_hour INTEGER,
                recovery_time INTEGER,
                stay_active INTEGER,
                training_frequency INTEGER,
                training_volume INTEGER,
                raw_data BLOB NOT NULL
            );
            CREATE INDEX idx_daily_activity_user_day ON daily_activity(user_id, day);

            CREATE TABLE daily_sleep (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                score INTEGER,
                timestamp TEXT NOT NULL,
                deep_sleep INTEGER,
                efficiency INTEGER,
                latency INTEGER,
                rem_sleep INTEGER,
                restfulness INTEGER,
                timing INTEGER,
                total_sleep INTEGER,
                raw_data BLOB NOT NULL
            );
            CREATE INDEX idx_daily_sleep_user_day ON daily_sleep(user_id, day);

            CREATE TABLE daily_readiness (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                score INTEGER,
                timestamp TEXT NOT NULL,
                temperature_deviation REAL,
                temperature_trend_deviation REAL,
                activity_balance INTEGER,
                body_temperature INTEGER,
                hrv_balance INTEGER,
                previous_day_activity INTEGER,
                previous_night INTEGER,
                recovery_index INTEGER,
                resting_heart_rate INTEGER,
                sleep_balance INTEGER,
                sleep_regularity INTEGER,
                raw_data BLOB NOT NULL
            );
            CREATE INDEX idx_daily_readiness_user_day ON daily_readiness(user_id, day);

            CREATE TABLE daily_spo2 (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                breathing_disturbance_index INTEGER,
                spo2_percentage_average REAL,
                raw_data BLOB NOT NULL
            );
            CREATE INDEX idx_daily_spo2_user_day ON daily_spo2(user_id, day);

            CREATE TABLE daily_stress (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                day_summary TEXT,
                recovery_high INTEGER,
                stress_high INTEGER,
                raw_data BLOB NOT NULL
            );
            CREATE INDEX idx_daily_stress_user_day ON daily_stress(user_id, day);
            "#,
        ),
    ])
}

/// SQLite storage for credentials and typed records
///
/// One connection guarded by a mutex. Each trait call locks it, runs in its
/// own transaction where it writes, and releases it on return.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        // WAL keeps readers unblocked during writes and survives crashes
        // mid-transaction; NORMAL sync is safe under WAL.
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }
}

impl TokenStore for SqliteStore {
    fn load_credential(&self, account_id: &str) -> Result<Option<Credential>> {
        let conn = self.conn()?;

        let row: Option<(String, String, String, String, Option<String>, String, String)> = conn
            .query_row(
                "SELECT account_id, access_token, refresh_token, token_type, expires_at,
                        granted_scopes, updated_at
                 FROM oauth_tokens WHERE account_id = ?",
                [account_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            account_id,
            access_token,
            refresh_token,
            token_type,
            expires_at_str,
            granted_scopes,
            updated_at_str,
        )) = row
        else {
            return Ok(None);
        };

        let expires_at = expires_at_str
            .as_deref()
            .map(parse_stored_timestamp)
            .transpose()
            .context("Invalid expires_at in oauth_tokens")?;
        let updated_at =
            parse_stored_timestamp(&updated_at_str).context("Invalid updated_at in oauth_tokens")?;

        Ok(Some(Credential {
            account_id,
            access_token,
            refresh_token,
            token_type,
            expires_at,
            granted_scopes,
            updated_at,
        }))
    }

    fn upsert_credential(&self, credential: &Credential) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // ON CONFLICT keeps the row (and its created_at / rowid) in place
        tx.execute(
            "INSERT INTO oauth_tokens
             (account_id, access_token, refresh_token, token_type, expires_at,
              granted_scopes, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(account_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_type = excluded.token_type,
                expires_at = excluded.expires_at,
                granted_scopes = excluded.granted_scopes,
                updated_at = excluded.updated_at",
            params![
                credential.account_id,
                credential.access_token,
                credential.refresh_token,
                credential.token_type,
                credential.expires_at.map(|t| t.to_rfc3339()),
                credential.granted_scopes,
                credential.updated_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT account_id FROM oauth_tokens ORDER BY rowid")?;
        let accounts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(accounts)
    }
}

impl RecordStore for SqliteStore {
    fn find_record(&self, kind: RecordKind, id: &str) -> Result<Option<Record>> {
        let conn = self.conn()?;
        let sql = format!("SELECT * FROM {} WHERE id = ?", kind.table());

        let record = conn
            .query_row(&sql, [id], |row| match kind {
                RecordKind::DailyActivity => read_daily_activity(row).map(Record::DailyActivity),
                RecordKind::DailySleep => read_daily_sleep(row).map(Record::DailySleep),
                RecordKind::DailyReadiness => {
                    read_daily_readiness(row).map(Record::DailyReadiness)
                }
                RecordKind::DailySpo2 => read_daily_spo2(row).map(Record::DailySpo2),
                RecordKind::DailyStress => read_daily_stress(row).map(Record::DailyStress),
                RecordKind::PersonalInfo => read_personal_info(row).map(Record::PersonalInfo),
            })
            .optional()
            .with_context(|| format!("Failed to load {kind} record {id}"))?;

        Ok(record)
    }

    fn upsert_record(&self, record: &Record) -> Result<UpsertOutcome> {
        let kind = record.kind();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", kind.table()),
                [record.id()],
                |row| row.get(0),
            )
            .context("Failed to check for existing record")?;

        match record {
            Record::DailyActivity(r) => write_daily_activity(&tx, r)?,
            Record::DailySleep(r) => write_daily_sleep(&tx, r)?,
            Record::DailyReadiness(r) => write_daily_readiness(&tx, r)?,
            Record::DailySpo2(r) => write_daily_spo2(&tx, r)?,
            Record::DailyStress(r) => write_daily_stress(&tx, r)?,
            Record::PersonalInfo(r) => write_personal_info(&tx, r)?,
        }

        tx.commit()?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn count_records(&self, kind: RecordKind) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// === Raw payload compression ===

fn compress_json(value: &Value) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(value)?;
    // Level 3 = good balance of speed vs compression
    zstd::encode_all(bytes.as_slice(), 3).context("Failed to compress raw_data")
}

fn decompress_json(data: &[u8]) -> Result<Value> {
    let bytes = zstd::decode_all(data).context("Failed to decompress raw_data")?;
    serde_json::from_slice(&bytes).context("raw_data is not valid JSON")
}

// === Column helpers (errors must be rusqlite errors inside row closures) ===

fn conversion_error(ty: Type, err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, ty, err.into())
}

fn raw_column(row: &Row<'_>) -> rusqlite::Result<Value> {
    let blob: Vec<u8> = row.get("raw_data")?;
    decompress_json(&blob).map_err(|e| conversion_error(Type::Blob, e))
}

fn day_column(row: &Row<'_>) -> rusqlite::Result<NaiveDate> {
    let day: String = row.get("day")?;
    NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|e| conversion_error(Type::Text, anyhow!("invalid day {day}: {e}")))
}

fn timestamp_column(row: &Row<'_>) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let ts: String = row.get("timestamp")?;
    parse_stored_timestamp(&ts).map_err(|e| conversion_error(Type::Text, e))
}

fn day_string(day: &NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

// === Per-table readers ===

fn read_daily_activity(row: &Row<'_>) -> rusqlite::Result<DailyActivity> {
    Ok(DailyActivity {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        day: day_column(row)?,
        score: row.get("score")?,
        timestamp: timestamp_column(row)?,
        active_calories: row.get("active_calories")?,
        average_met_minutes: row.get("average_met_minutes")?,
        equivalent_walking_distance: row.get("equivalent_walking_distance")?,
        high_activity_met_minutes: row.get("high_activity_met_minutes")?,
        high_activity_time: row.get("high_activity_time")?,
        inactivity_alerts: row.get("inactivity_alerts")?,
        low_activity_met_minutes: row.get("low_activity_met_minutes")?,
        low_activity_time: row.get("low_activity_time")?,
        medium_activity_met_minutes: row.get("medium_activity_met_minutes")?,
        medium_activity_time: row.get("medium_activity_time")?,
        meters_to_target: row.get("meters_to_target")?,
        non_wear_time: row.get("non_wear_time")?,
        resting_time: row.get("resting_time")?,
        sedentary_met_minutes: row.get("sedentary_met_minutes")?,
        sedentary_time: row.get("sedentary_time")?,
        steps: row.get("steps")?,
        target_calories: row.get("target_calories")?,
        target_meters: row.get("target_meters")?,
        total_calories: row.get("total_calories")?,
        class_5_min: row.get("class_5_min")?,
        met_interval: row.get("met_interval")?,
        meet_daily_targets: row.get("meet_daily_targets")?,
        move_every_hour: row.get("move_every_hour")?,
        recovery_time: row.get("recovery_time")?,
        stay_active: row.get("stay_active")?,
        training_frequency: row.get("training_frequency")?,
        training_volume: row.get("training_volume")?,
        raw_data: raw_column(row)?,
    })
}

fn read_daily_sleep(row: &Row<'_>) -> rusqlite::Result<DailySleep> {
    Ok(DailySleep {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        day: day_column(row)?,
        score: row.get("score")?,
        timestamp: timestamp_column(row)?,
        deep_sleep: row.get("deep_sleep")?,
        efficiency: row.get("efficiency")?,
        latency: row.get("latency")?,
        rem_sleep: row.get("rem_sleep")?,
        restfulness: row.get("restfulness")?,
        timing: row.get("timing")?,
        total_sleep: row.get("total_sleep")?,
        raw_data: raw_column(row)?,
    })
}

fn read_daily_readiness(row: &Row<'_>) -> rusqlite::Result<DailyReadiness> {
    Ok(DailyReadiness {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        day: day_column(row)?,
        score: row.get("score")?,
        timestamp: timestamp_column(row)?,
        temperature_deviation: row.get("temperature_deviation")?,
        temperature_trend_deviation: row.get("temperature_trend_deviation")?,
        activity_balance: row.get("activity_balance")?,
        body_temperature: row.get("body_temperature")?,
        hrv_balance: row.get("hrv_balance")?,
        previous_day_activity: row.get("previous_day_activity")?,
        previous_night: row.get("previous_night")?,
        recovery_index: row.get("recovery_index")?,
        resting_heart_rate: row.get("resting_heart_rate")?,
        sleep_balance: row.get("sleep_balance")?,
        sleep_regularity: row.get("sleep_regularity")?,
        raw_data: raw_column(row)?,
    })
}

fn read_daily_spo2(row: &Row<'_>) -> rusqlite::Result<DailySpo2> {
    Ok(DailySpo2 {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        day: day_column(row)?,
        breathing_disturbance_index: row.get("breathing_disturbance_index")?,
        spo2_percentage_average: row.get("spo2_percentage_average")?,
        raw_data: raw_column(row)?,
    })
}

fn read_daily_stress(row: &Row<'_>) -> rusqlite::Result<DailyStress> {
    Ok(DailyStress {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        day: day_column(row)?,
        day_summary: row.get("day_summary")?,
        recovery_high: row.get("recovery_high")?,
        stress_high: row.get("stress_high")?,
        raw_data: raw_column(row)?,
    })
}

fn read_personal_info(row: &Row<'_>) -> rusqlite::Result<PersonalInfo> {
    Ok(PersonalInfo {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        age: row.get("age")?,
        weight: row.get("weight")?,
        height: row.get("height")?,
        biological_sex: row.get("biological_sex")?,
        email: row.get("email")?,
        raw_data: raw_column(row)?,
    })
}

// === Per-table writers ===
//
// INSERT OR REPLACE is fine here: record tables have no dependents to cascade.

fn write_daily_activity(tx: &Transaction<'_>, r: &DailyActivity) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO daily_activity
         (id, user_id, day, score, timestamp, active_calories, average_met_minutes,
          equivalent_walking_distance, high_activity_met_minutes, high_activity_time,
          inactivity_alerts, low_activity_met_minutes, low_activity_time,
          medium_activity_met_minutes, medium_activity_time, meters_to_target,
          non_wear_time, resting_time, sedentary_met_minutes, sedentary_time, steps,
          target_calories, target_meters, total_calories, class_5_min, met_interval,
          meet_daily_targets, move_every_hour, recovery_time, stay_active,
          training_frequency, training_volume, raw_data)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            day_string(&r.day),
            r.score,
            r.timestamp.to_rfc3339(),
            r.active_calories,
            r.average_met_minutes,
            r.equivalent_walking_distance,
            r.high_activity_met_minutes,
            r.high_activity_time,
            r.inactivity_alerts,
            r.low_activity_met_minutes,
            r.low_activity_time,
            r.medium_activity_met_minutes,
            r.medium_activity_time,
            r.meters_to_target,
            r.non_wear_time,
            r.resting_time,
            r.sedentary_met_minutes,
            r.sedentary_time,
            r.steps,
            r.target_calories,
            r.target_meters,
            r.total_calories,
            r.class_5_min,
            r.met_interval,
            r.meet_daily_targets,
            r.move_every_hour,
            r.recovery_time,
            r.stay_active,
            r.training_frequency,
            r.training_volume,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}

fn write_daily_sleep(tx: &Transaction<'_>, r: &DailySleep) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO daily_sleep
         (id, user_id, day, score, timestamp, deep_sleep, efficiency, latency,
          rem_sleep, restfulness, timing, total_sleep, raw_data)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            day_string(&r.day),
            r.score,
            r.timestamp.to_rfc3339(),
            r.deep_sleep,
            r.efficiency,
            r.latency,
            r.rem_sleep,
            r.restfulness,
            r.timing,
            r.total_sleep,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}

fn write_daily_readiness(tx: &Transaction<'_>, r: &DailyReadiness) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO daily_readiness
         (id, user_id, day, score, timestamp, temperature_deviation,
          temperature_trend_deviation, activity_balance, body_temperature, hrv_balance,
          previous_day_activity, previous_night, recovery_index, resting_heart_rate,
          sleep_balance, sleep_regularity, raw_data)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            day_string(&r.day),
            r.score,
            r.timestamp.to_rfc3339(),
            r.temperature_deviation,
            r.temperature_trend_deviation,
            r.activity_balance,
            r.body_temperature,
            r.hrv_balance,
            r.previous_day_activity,
            r.previous_night,
            r.recovery_index,
            r.resting_heart_rate,
            r.sleep_balance,
            r.sleep_regularity,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}

fn write_daily_spo2(tx: &Transaction<'_>, r: &DailySpo2) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO daily_spo2
         (id, user_id, day, breathing_disturbance_index, spo2_percentage_average, raw_data)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            day_string(&r.day),
            r.breathing_disturbance_index,
            r.spo2_percentage_average,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}

fn write_daily_stress(tx: &Transaction<'_>, r: &DailyStress) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO daily_stress
         (id, user_id, day, day_summary, recovery_high, stress_high, raw_data)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            day_string(&r.day),
            r.day_summary,
            r.recovery_high,
            r.stress_high,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}

fn write_personal_info(tx: &Transaction<'_>, r: &PersonalInfo) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO personal_info
         (id, user_id, age, weight, height, biological_sex, email, raw_data)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.user_id,
            r.age,
            r.weight,
            r.height,
            r.biological_sex,
            r.email,
            compress_json(&r.raw_data)?,
        ],
    )?;
    Ok(())
}
