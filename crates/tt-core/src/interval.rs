//! The recorded time span and its identifier.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when constructing an [`Interval`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// The end of the span lies before its start.
    #[error("interval ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Stable identifier assigned to an interval when it is created.
///
/// Edits and deletes target intervals by this id, so two entries with the
/// same times and description stay individually addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(Uuid);

impl IntervalId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IntervalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded start/end span.
///
/// Timestamps are naive local times. The interval belongs to the calendar
/// date of its start, even when it runs past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IntervalRecord", into = "IntervalRecord")]
pub struct Interval {
    id: IntervalId,
    start: NaiveDateTime,
    end: NaiveDateTime,
    description: String,
    is_absence: bool,
}

impl Interval {
    /// Creates a work or absence interval with a fresh id.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: impl Into<String>,
        is_absence: bool,
    ) -> Result<Self, IntervalError> {
        Self::with_id(IntervalId::new(), start, end, description, is_absence)
    }

    /// Creates an interval carrying an existing id.
    pub fn with_id(
        id: IntervalId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: impl Into<String>,
        is_absence: bool,
    ) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::EndBeforeStart { start, end });
        }
        Ok(Self {
            id,
            start,
            end,
            description: description.into(),
            is_absence,
        })
    }

    /// Creates a live work interval where `start == end`.
    pub fn live(start: NaiveDateTime, description: impl Into<String>) -> Self {
        Self {
            id: IntervalId::new(),
            start,
            end: start,
            description: description.into(),
            is_absence: false,
        }
    }

    pub const fn id(&self) -> IntervalId {
        self.id
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn is_absence(&self) -> bool {
        self.is_absence
    }

    /// Calendar date of the start timestamp; the key used by the entry store.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Length of the span.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Compares the user-visible fields, ignoring the id.
    pub fn same_span(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.description == other.description
            && self.is_absence == other.is_absence
    }

    /// Moves the end of the span, never before its start.
    pub(crate) fn close_at(&mut self, end: NaiveDateTime) {
        self.end = end.max(self.start);
    }

    /// Returns a copy with new span data but the same id.
    pub fn edited(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: impl Into<String>,
        is_absence: bool,
    ) -> Result<Self, IntervalError> {
        Self::with_id(self.id, start, end, description, is_absence)
    }
}

/// Serialized shape of an interval.
///
/// Accepts the older `start_time`/`end_time` keys and records without an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IntervalRecord {
    #[serde(default)]
    id: IntervalId,
    #[serde(alias = "start_time")]
    start: NaiveDateTime,
    #[serde(alias = "end_time")]
    end: NaiveDateTime,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_absence: bool,
}

impl TryFrom<IntervalRecord> for Interval {
    type Error = IntervalError;

    fn try_from(record: IntervalRecord) -> Result<Self, Self::Error> {
        Self::with_id(
            record.id,
            record.start,
            record.end,
            record.description,
            record.is_absence,
        )
    }
}

impl From<Interval> for IntervalRecord {
    fn from(interval: Interval) -> Self {
        Self {
            id: interval.id,
            start: interval.start,
            end: interval.end,
            description: interval.description,
            is_absence: interval.is_absence,
        }
    }
}
