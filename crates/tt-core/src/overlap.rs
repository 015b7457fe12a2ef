//! Duration and overlap accounting.
//!
//! Two accounting modes exist for a day's worked total:
//!
//! - [`AccountingMode::OverlapAware`] subtracts, for every work interval,
//!   its overlap with each absence recorded on the same day.
//! - [`AccountingMode::Legacy`] sums work durations and ignores absences.
//!
//! In overlap-aware mode each single overlap is bounded by the work
//! interval's span, but the per-interval sum of overlaps is not clamped: two
//! absences that overlap each other and both cover the same work interval
//! subtract twice.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Interval;

/// How a day's worked total treats absences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMode {
    /// Work minus overlapping absence time.
    #[default]
    #[serde(rename = "overlap")]
    OverlapAware,
    /// Plain sum of work durations.
    Legacy,
}

impl AccountingMode {
    /// String representation used in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OverlapAware => "overlap",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for AccountingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unknown accounting mode name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown accounting mode: {0} (expected \"overlap\" or \"legacy\")")]
pub struct UnknownAccountingMode(pub String);

impl FromStr for AccountingMode {
    type Err = UnknownAccountingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overlap" => Ok(Self::OverlapAware),
            "legacy" => Ok(Self::Legacy),
            _ => Err(UnknownAccountingMode(s.to_string())),
        }
    }
}

/// Length of the shared part of two spans, zero when they do not meet.
pub fn overlap(a: &Interval, b: &Interval) -> Duration {
    let start = a.start().max(b.start());
    let end = a.end().min(b.end());
    if start < end {
        end - start
    } else {
        Duration::zero()
    }
}

/// Worked time contributed by one work interval given the day's absences.
pub fn worked_duration<'a>(
    work: &Interval,
    absences: impl IntoIterator<Item = &'a Interval>,
) -> Duration {
    absences
        .into_iter()
        .fold(work.duration(), |acc, absence| acc - overlap(work, absence))
}

/// Total worked time across the intervals of a single day.
pub fn worked_total(intervals: &[Interval], mode: AccountingMode) -> Duration {
    let work = intervals.iter().filter(|e| !e.is_absence());
    match mode {
        AccountingMode::Legacy => work.fold(Duration::zero(), |acc, e| acc + e.duration()),
        AccountingMode::OverlapAware => work.fold(Duration::zero(), |acc, e| {
            acc + worked_duration(e, intervals.iter().filter(|a| a.is_absence()))
        }),
    }
}
