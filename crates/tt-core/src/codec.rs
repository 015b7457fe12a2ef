//! Encoding of the date-indexed entry map.
//!
//! The document is a JSON object keyed by ISO-8601 date. Each value is the
//! ordered list of intervals recorded on that date:
//!
//! ```json
//! {
//!   "2025-11-10": [
//!     {
//!       "id": "6f1c…",
//!       "start": "2025-11-10T09:00:00",
//!       "end": "2025-11-10T11:00:00",
//!       "description": "Coding",
//!       "is_absence": false
//!     }
//!   ]
//! }
//! ```
//!
//! Keys are written in date order, so encoding a decoded document yields the
//! same bytes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::Interval;

/// Intervals grouped by calendar date, each bucket in insertion order.
pub type EntryMap = BTreeMap<NaiveDate, Vec<Interval>>;

/// Errors decoding an entry document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed entry document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serializes the entry map as pretty-printed JSON.
pub fn encode(entries: &EntryMap) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

/// Parses an entry document.
///
/// Intervals are re-keyed by their own start date and empty buckets are
/// dropped, so a hand-edited file cannot break the index invariants.
pub fn decode(input: &str) -> Result<EntryMap, CodecError> {
    let raw: BTreeMap<NaiveDate, Vec<Interval>> = serde_json::from_str(input)?;
    Ok(index(raw.into_values().flatten()))
}

/// Builds a date index from intervals, keeping their relative order.
pub fn index(intervals: impl IntoIterator<Item = Interval>) -> EntryMap {
    let mut entries = EntryMap::new();
    for interval in intervals {
        entries.entry(interval.date()).or_default().push(interval);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::fixtures::{absence, day, work};

    fn sample() -> EntryMap {
        index([
            work(day(2025, 11, 10), (9, 0), (11, 0), "Coding"),
            absence(day(2025, 11, 10), (13, 0), (14, 0), "Doctor"),
            work(day(2025, 11, 11), (9, 0), (12, 0), ""),
        ])
    }

    #[test]
    fn test_encode_is_stable_across_reload() {
        let first = encode(&sample()).unwrap();
        let second = encode(&decode(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_uses_date_keys_and_record_fields() {
        let json = encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let day1 = value["2025-11-10"].as_array().unwrap();
        assert_eq!(day1.len(), 2);
        assert_eq!(day1[0]["start"], "2025-11-10T09:00:00");
        assert_eq!(day1[0]["end"], "2025-11-10T11:00:00");
        assert_eq!(day1[0]["description"], "Coding");
        assert_eq!(day1[1]["is_absence"], true);
        assert!(day1[0]["id"].is_string());
    }

    #[test]
    fn test_decode_rekeys_misfiled_records() {
        let json = r#"{
            "2025-11-10": [
                {"start": "2025-11-11T09:00:00", "end": "2025-11-11T10:00:00", "description": "moved"}
            ],
            "2025-11-12": []
        }"#;
        let entries = decode(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[&day(2025, 11, 11)][0].description(), "moved");
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(decode("{ not json").is_err());
        assert!(decode("[]").is_err());
    }

    #[test]
    fn test_decode_rejects_inverted_interval() {
        let json = r#"{"2025-11-10": [{"start": "2025-11-10T10:00:00", "end": "2025-11-10T09:00:00"}]}"#;
        assert!(decode(json).is_err());
    }

    #[test]
    fn test_index_preserves_bucket_order() {
        let d = day(2025, 11, 10);
        let late = work(d, (15, 0), (16, 0), "late");
        let early = work(d, (8, 0), (9, 0), "early");
        let entries = index([late.clone(), early.clone()]);
        assert_eq!(entries[&d], vec![late, early]);
    }
}
