//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Local wall-clock time, whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Parse a day as `YYYY-MM-DD`, `today` or `yesterday`.
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match s.trim() {
        "today" => Ok(today),
        "yesterday" => today.pred_opt().context("date out of range"),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {other}. Use YYYY-MM-DD")),
    }
}

/// Resolve an optional `--date` argument, defaulting to `today`.
pub fn date_or_today(s: Option<&str>, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    s.map_or(Ok(today), |s| parse_date(s, today))
}

/// Parse a local timestamp.
///
/// Supports:
/// - Full: "2025-11-10T09:30", "2025-11-10 09:30:15"
/// - Time of day on `date`: "09:30", "09:30:15"
/// - "now"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_timestamp(s: &str, date: NaiveDate, now: NaiveDateTime) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if s == "now" {
        return Ok(now);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Ok(dt);
    }

    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
    {
        return Ok(date.and_time(time));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use HH:MM, YYYY-MM-DD HH:MM, ISO 8601, 'now' or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Formats a duration as `HH:MM:SS`, with a leading `-` when negative.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn noon() -> NaiveDateTime {
        day().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_parses_time_of_day_on_given_date() {
        let parsed = parse_timestamp("09:30", day(), noon()).unwrap();
        assert_eq!(parsed, day().and_hms_opt(9, 30, 0).unwrap());
        let parsed = parse_timestamp("09:30:15", day(), noon()).unwrap();
        assert_eq!(parsed, day().and_hms_opt(9, 30, 15).unwrap());
    }

    #[test]
    fn test_parses_full_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 11)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-11-11T08:15", day(), noon()).unwrap(), expected);
        assert_eq!(parse_timestamp("2025-11-11 08:15:00", day(), noon()).unwrap(), expected);
    }

    #[test]
    fn test_parses_now_and_relative() {
        assert_eq!(parse_timestamp("now", day(), noon()).unwrap(), noon());
        assert_eq!(
            parse_timestamp("2 hours ago", day(), noon()).unwrap(),
            day().and_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("1 day ago", day(), noon()).unwrap(),
            noon() - Duration::days(1)
        );
    }

    #[test]
    fn test_rejects_garbage_and_overflow() {
        assert!(parse_timestamp("half past nine", day(), noon()).is_err());
        assert!(parse_timestamp("99999999999 weeks ago", day(), noon()).is_err());
    }

    #[test]
    fn test_parses_dates() {
        assert_eq!(parse_date("2025-11-01", day()).unwrap(), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(parse_date("today", day()).unwrap(), day());
        assert_eq!(parse_date("yesterday", day()).unwrap(), NaiveDate::from_ymd_opt(2025, 11, 9).unwrap());
        assert!(parse_date("11/10/2025", day()).is_err());
        assert_eq!(date_or_today(None, day()).unwrap(), day());
    }

    #[test]
    fn test_formats_durations() {
        assert_eq!(format_duration(Duration::seconds(2 * 3600 + 30 * 60 + 15)), "02:30:15");
        assert_eq!(format_duration(Duration::minutes(45)), "00:45:00");
        assert_eq!(format_duration(Duration::hours(-1)), "-01:00:00");
    }
}
