//! Date range selection for a sync run
//!
//! Pure functions that can be tested without a server.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, TimeDelta};

/// Days synced when only an end date (or nothing) is given
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Resolve the inclusive day range to sync.
///
/// # Arguments
/// * `initial` - Backfill `days_back` days up to `today`, ignoring `start`/`end`
/// * `start` - First day; defaults to `end` minus seven days
/// * `end` - Last day; defaults to `today`
/// * `today` - The caller's current date
/// * `days_back` - Backfill window for `initial`
pub fn resolve_date_range(
    initial: bool,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    days_back: i64,
) -> Result<(NaiveDate, NaiveDate)> {
    if initial {
        if days_back < 0 {
            bail!("Backfill window must not be negative: {days_back} days");
        }
        return Ok((days_before(today, days_back)?, today));
    }

    let end = end.unwrap_or(today);
    let start = match start {
        Some(start) => start,
        None => days_before(end, DEFAULT_WINDOW_DAYS)?,
    };
    if start > end {
        bail!("Start date {start} is after end date {end}");
    }
    Ok((start, end))
}

fn days_before(day: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| day.checked_sub_signed(delta))
        .with_context(|| format!("{days} days before {day} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_defaults_to_last_week() {
        let range = resolve_date_range(false, None, None, day("2024-03-10"), 90).unwrap();
        assert_eq!(range, (day("2024-03-03"), day("2024-03-10")));
    }

    #[test]
    fn test_start_defaults_relative_to_end() {
        let range =
            resolve_date_range(false, None, Some(day("2024-02-01")), day("2024-03-10"), 90)
                .unwrap();
        assert_eq!(range, (day("2024-01-25"), day("2024-02-01")));
    }

    #[test]
    fn test_initial_backfill_ignores_explicit_dates() {
        let range = resolve_date_range(
            true,
            Some(day("2024-03-01")),
            Some(day("2024-03-02")),
            day("2024-03-10"),
            90,
        )
        .unwrap();
        assert_eq!(range, (day("2023-12-11"), day("2024-03-10")));
    }

    #[test]
    fn test_single_day_range() {
        let d = day("2024-03-05");
        let range = resolve_date_range(false, Some(d), Some(d), day("2024-03-10"), 90).unwrap();
        assert_eq!(range, (d, d));
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let result = resolve_date_range(
            false,
            Some(day("2024-03-09")),
            Some(day("2024-03-01")),
            day("2024-03-10"),
            90,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_backfill_window_out_of_range() {
        let today = day("2024-03-10");
        assert!(resolve_date_range(true, None, None, today, -1).is_err());
        assert!(resolve_date_range(true, None, None, today, i64::MAX).is_err());
        assert_eq!(resolve_date_range(true, None, None, today, 0).unwrap(), (today, today));
    }
}
