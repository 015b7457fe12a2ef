//! Pivoted hours-per-description report.
//!
//! Rows are distinct `(label, is_absence)` pairs, columns are every date of an
//! inclusive range. Cells hold hours rounded to two decimals; absence rows are
//! negative so a column can be summed directly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::Interval;
use crate::codec::EntryMap;

/// Row label used for entries without a description.
pub const NO_DESCRIPTION: &str = "(no description)";

/// Prefix marking absence rows.
pub const ABSENCE_PREFIX: &str = "🏖 Absence: ";

/// One report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub is_absence: bool,
    /// Hours per date, aligned with [`Report::dates`].
    pub hours: Vec<f64>,
}

impl ReportRow {
    /// Sum of the row, rounded to two decimals.
    pub fn total(&self) -> f64 {
        round_hours(self.hours.iter().sum())
    }
}

/// Dense report matrix over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// True when no entry fell inside the range.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Row label to hours per date.
    pub fn matrix(&self) -> BTreeMap<&str, &[f64]> {
        self.rows
            .iter()
            .map(|r| (r.label.as_str(), r.hours.as_slice()))
            .collect()
    }

    pub fn row_total(&self, index: usize) -> Option<f64> {
        self.rows.get(index).map(ReportRow::total)
    }

    /// Sum of each date column, absences included as negatives.
    pub fn column_totals(&self) -> Vec<f64> {
        (0..self.dates.len())
            .map(|i| round_hours(self.rows.iter().map(|r| r.hours[i]).sum()))
            .collect()
    }

    pub fn grand_total(&self) -> f64 {
        round_hours(self.rows.iter().flat_map(|r| r.hours.iter()).sum())
    }
}

/// Row label for an interval: trimmed description or placeholder, with the
/// absence prefix where it applies.
pub fn row_label(interval: &Interval) -> String {
    let description = interval.description().trim();
    let description = if description.is_empty() {
        NO_DESCRIPTION
    } else {
        description
    };
    if interval.is_absence() {
        format!("{ABSENCE_PREFIX}{description}")
    } else {
        description.to_string()
    }
}

/// Builds the report for `start..=end`; a reversed range is swapped.
pub fn generate_report(entries: &EntryMap, start: NaiveDate, end: NaiveDate) -> Report {
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();

    let mut seconds: HashMap<(NaiveDate, String, bool), i64> = HashMap::new();
    let mut keys: BTreeSet<(String, bool)> = BTreeSet::new();
    for (date, bucket) in entries.range(start..=end) {
        for interval in bucket {
            let label = row_label(interval);
            let is_absence = interval.is_absence();
            *seconds
                .entry((*date, label.clone(), is_absence))
                .or_default() += interval.duration().num_seconds();
            keys.insert((label, is_absence));
        }
    }

    let rows = keys
        .into_iter()
        .map(|(label, is_absence)| {
            let hours = dates
                .iter()
                .map(|date| {
                    let secs = seconds
                        .get(&(*date, label.clone(), is_absence))
                        .copied()
                        .unwrap_or(0);
                    let hours = seconds_to_hours(secs);
                    if is_absence && hours != 0.0 { -hours } else { hours }
                })
                .collect();
            ReportRow {
                label,
                is_absence,
                hours,
            }
        })
        .collect();

    Report { dates, rows }
}

#[allow(clippy::cast_precision_loss)]
fn seconds_to_hours(seconds: i64) -> f64 {
    round_hours(seconds as f64 / 3600.0)
}

/// Rounds to two decimals; adding zero folds `-0.0` into `0.0`.
fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0 + 0.0
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::codec::index;
    use crate::interval::fixtures::{absence, day, work};

    fn two_day_entries() -> EntryMap {
        index([
            work(day(2025, 11, 10), (9, 0), (11, 0), "Coding"),
            work(day(2025, 11, 10), (13, 0), (17, 0), "Meeting"),
            work(day(2025, 11, 11), (9, 0), (12, 0), "Coding"),
        ])
    }

    #[test]
    fn test_two_day_report_pivots_hours() {
        let report = generate_report(&two_day_entries(), day(2025, 11, 10), day(2025, 11, 11));
        assert_eq!(report.dates, vec![day(2025, 11, 10), day(2025, 11, 11)]);
        assert_eq!(report.row_labels(), vec!["Coding", "Meeting"]);
        let matrix = report.matrix();
        assert_eq!(matrix["Coding"], &[2.0, 3.0]);
        assert_eq!(matrix["Meeting"], &[4.0, 0.0]);
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let forward = generate_report(&two_day_entries(), day(2025, 11, 10), day(2025, 11, 11));
        let reversed = generate_report(&two_day_entries(), day(2025, 11, 11), day(2025, 11, 10));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_dates_are_dense() {
        let report = generate_report(&two_day_entries(), day(2025, 11, 8), day(2025, 11, 12));
        assert_eq!(report.dates.len(), 5);
        assert_eq!(report.matrix()["Coding"], &[0.0, 0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_empty_range_has_no_rows() {
        let report = generate_report(&two_day_entries(), day(2025, 12, 1), day(2025, 12, 3));
        assert!(report.is_empty());
        assert!(report.matrix().is_empty());
        assert_eq!(report.dates.len(), 3);
    }

    #[test]
    fn test_blank_descriptions_use_placeholder_and_trim() {
        let d = day(2025, 11, 10);
        let entries = index([
            work(d, (9, 0), (10, 0), "   "),
            work(d, (10, 0), (10, 30), "  Coding "),
            work(d, (11, 0), (12, 0), "Coding"),
        ]);
        let report = generate_report(&entries, d, d);
        assert_eq!(report.row_labels(), vec![NO_DESCRIPTION, "Coding"]);
        assert_eq!(report.matrix()["Coding"], &[1.5]);
    }

    #[test]
    fn test_absences_are_negative_and_prefixed() {
        let d = day(2025, 11, 10);
        let entries = index([
            work(d, (9, 0), (13, 0), "Vacation"),
            absence(d, (13, 0), (17, 0), "Vacation"),
        ]);
        let report = generate_report(&entries, d, d.succ_opt().unwrap());
        assert_eq!(report.row_labels(), vec!["Vacation", "🏖 Absence: Vacation"]);
        let matrix = report.matrix();
        assert_eq!(matrix["🏖 Absence: Vacation"], &[-4.0, 0.0]);
        assert_eq!(report.rows[1].hours[1].to_bits(), 0.0_f64.to_bits());
        assert_eq!(report.column_totals(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_duplicated_entries_accumulate() {
        let d = day(2025, 11, 10);
        let entries = index([
            work(d, (9, 0), (10, 0), "Coding"),
            work(d, (9, 0), (10, 0), "Coding"),
        ]);
        let report = generate_report(&entries, d, d);
        assert_eq!(report.matrix()["Coding"], &[2.0]);
    }

    #[test]
    fn test_hours_round_to_two_decimals() {
        let d = day(2025, 11, 10);
        let entries = index([work(d, (9, 0), (9, 20), "Standup")]);
        let report = generate_report(&entries, d, d);
        assert_eq!(report.matrix()["Standup"], &[0.33]);
    }

    #[test]
    fn test_totals_sum_rows_and_columns() {
        let report = generate_report(&two_day_entries(), day(2025, 11, 10), day(2025, 11, 11));
        assert_eq!(report.rows[0].total(), 5.0);
        assert_eq!(report.row_total(1), Some(4.0));
        assert_eq!(report.row_total(2), None);
        assert_eq!(report.column_totals(), vec![6.0, 3.0]);
        assert_eq!(report.grand_total(), 9.0);
    }

    #[test]
    fn test_empty_totals_are_positive_zero() {
        let report = generate_report(&EntryMap::new(), day(2025, 11, 10), day(2025, 11, 10));
        assert_eq!(report.column_totals()[0].to_bits(), 0.0_f64.to_bits());
        assert_eq!(report.grand_total().to_bits(), 0.0_f64.to_bits());
    }
}
