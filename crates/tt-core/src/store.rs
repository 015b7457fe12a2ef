//! The authoritative set of time entries.
//!
//! [`EntryStore`] owns the date-indexed intervals, at most one running timer
//! and a single-slot undo buffer for deletes. Every operation that changes the
//! date index writes the whole index back through its [`Persistence`] before
//! returning. A failed write leaves the store exactly as it was.
//!
//! # Invariants
//!
//! - A date key is never present with an empty bucket.
//! - The running interval is never also stored in the index.
//! - Buckets keep insertion order; edits on the same date keep position.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, EntryMap};
use crate::overlap::{self, AccountingMode};
use crate::persistence::{LoadWarning, PersistError, Persistence};
use crate::report::{self, Report};
use crate::{Interval, IntervalId};

/// Errors returned by [`EntryStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A timer is already running.
    #[error("timer already running")]
    AlreadyRunning,
    /// No timer is running.
    #[error("no timer running")]
    NotRunning,
    /// The operation is not valid for the given entry.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// The targeted entry is not in the store.
    #[error("entry {id} not found on {date}")]
    NotFound { id: IntervalId, date: NaiveDate },
    /// The change could not be written.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Running timer and undo slot, kept apart from the entry index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub current: Option<Interval>,
    #[serde(default)]
    pub last_deleted: Option<Interval>,
}

/// Date-indexed entry store backed by a [`Persistence`].
#[derive(Debug)]
pub struct EntryStore<P> {
    persistence: P,
    entries: EntryMap,
    current: Option<Interval>,
    last_deleted: Option<Interval>,
    mode: AccountingMode,
    load_warnings: Vec<LoadWarning>,
}

/// Local wall-clock time, whole seconds.
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

impl<P: Persistence> EntryStore<P> {
    /// Loads the store from `persistence`.
    ///
    /// Load problems never fail construction; see [`Self::load_warnings`].
    pub fn open(persistence: P) -> Self {
        let loaded = persistence.load();
        Self {
            persistence,
            entries: loaded.entries,
            current: None,
            last_deleted: None,
            mode: AccountingMode::default(),
            load_warnings: loaded.warnings,
        }
    }

    /// Problems encountered while loading; the store started empty if any.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }

    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    pub const fn mode(&self) -> AccountingMode {
        self.mode
    }

    pub const fn set_mode(&mut self, mode: AccountingMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AccountingMode) -> Self {
        self.mode = mode;
        self
    }

    /// The running interval, if any.
    pub const fn current(&self) -> Option<&Interval> {
        self.current.as_ref()
    }

    /// The interval that [`Self::undo_delete`] would restore.
    pub const fn last_deleted(&self) -> Option<&Interval> {
        self.last_deleted.as_ref()
    }

    /// Time since the running interval started.
    pub fn elapsed_at(&self, now: NaiveDateTime) -> Option<Duration> {
        self.current
            .as_ref()
            .map(|c| (now - c.start()).max(Duration::zero()))
    }

    // ========== Timer ==========

    pub fn start_timer(&mut self, description: impl Into<String>) -> Result<&Interval, StoreError> {
        self.start_timer_at(description, now())
    }

    /// Starts a live interval at `now`.
    pub fn start_timer_at(
        &mut self,
        description: impl Into<String>,
        now: NaiveDateTime,
    ) -> Result<&Interval, StoreError> {
        if self.current.is_some() {
            return Err(StoreError::AlreadyRunning);
        }
        Ok(&*self.current.insert(Interval::live(now, description)))
    }

    pub fn stop_timer(&mut self) -> Result<Interval, StoreError> {
        self.stop_timer_at(now())
    }

    /// Closes the live interval at `now` and files it under its start date.
    ///
    /// A `now` at or before the start files a zero-length interval rather
    /// than failing, so a running timer can always be stopped.
    pub fn stop_timer_at(&mut self, now: NaiveDateTime) -> Result<Interval, StoreError> {
        let mut interval = self.current.clone().ok_or(StoreError::NotRunning)?;
        interval.close_at(now);
        let mut entries = self.entries.clone();
        insert(&mut entries, interval.clone());
        self.commit(entries)?;
        self.current = None;
        Ok(interval)
    }

    /// Reopens a stored work interval as the running timer.
    ///
    /// The interval leaves the index immediately, but nothing is written: the
    /// removal becomes durable with the next persisted change (normally the
    /// [`Self::stop_timer`] that files it again). Resuming an interval that is
    /// not stored simply installs it as the timer.
    pub fn resume_entry(&mut self, interval: &Interval) -> Result<&Interval, StoreError> {
        if self.current.is_some() {
            return Err(StoreError::AlreadyRunning);
        }
        if interval.is_absence() {
            return Err(StoreError::InvalidOperation("absences cannot be resumed"));
        }
        let resumed = take(&mut self.entries, interval.date(), interval.id())
            .unwrap_or_else(|| interval.clone());
        Ok(&*self.current.insert(resumed))
    }

    // ========== Entries ==========

    /// Appends an interval to its date bucket.
    pub fn add_manual_entry(&mut self, interval: Interval) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        insert(&mut entries, interval);
        self.commit(entries)
    }

    pub fn entries_for_date(&self, date: NaiveDate) -> &[Interval] {
        self.entries.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Dates that have at least one entry, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.keys().copied()
    }

    /// Worked time on `date` under the store's accounting mode.
    pub fn total_worked_for_date(&self, date: NaiveDate) -> Duration {
        self.total_worked_for_date_with(date, self.mode)
    }

    pub fn total_worked_for_date_with(&self, date: NaiveDate, mode: AccountingMode) -> Duration {
        overlap::worked_total(self.entries_for_date(date), mode)
    }

    /// Replaces `old` with `new`.
    ///
    /// On the same date the replacement keeps its position; otherwise it is
    /// appended to the new date's bucket.
    pub fn update_entry(&mut self, old: &Interval, new: Interval) -> Result<(), StoreError> {
        let old_date = old.date();
        let position = position(&self.entries, old_date, old.id()).ok_or(StoreError::NotFound {
            id: old.id(),
            date: old_date,
        })?;

        let mut entries = self.entries.clone();
        if new.date() == old_date {
            if let Some(bucket) = entries.get_mut(&old_date) {
                bucket[position] = new;
            }
        } else {
            take(&mut entries, old_date, old.id());
            insert(&mut entries, new);
        }
        self.commit(entries)
    }

    /// Removes an interval, keeping it for a single undo.
    pub fn delete_entry(&mut self, interval: &Interval) -> Result<Interval, StoreError> {
        let mut entries = self.entries.clone();
        let removed = take(&mut entries, interval.date(), interval.id()).ok_or(StoreError::NotFound {
            id: interval.id(),
            date: interval.date(),
        })?;
        self.commit(entries)?;
        self.last_deleted = Some(removed.clone());
        Ok(removed)
    }

    /// Restores the most recently deleted interval.
    ///
    /// Returns `false` when there is nothing to restore.
    pub fn undo_delete(&mut self) -> Result<bool, StoreError> {
        let Some(last) = self.last_deleted.clone() else {
            return Ok(false);
        };
        let mut entries = self.entries.clone();
        insert(&mut entries, last);
        self.commit(entries)?;
        self.last_deleted = None;
        Ok(true)
    }

    /// Discards every stored interval and indexes `intervals` instead.
    ///
    /// The running timer is left alone.
    pub fn replace_all(&mut self, intervals: impl IntoIterator<Item = Interval>) -> Result<(), StoreError> {
        self.commit(codec::index(intervals))
    }

    /// All stored intervals, by date then insertion order.
    pub fn enumerate_all(&self) -> Vec<Interval> {
        self.entries.values().flatten().cloned().collect()
    }

    /// Hours per description and date over an inclusive range.
    pub fn generate_report(&self, start: NaiveDate, end: NaiveDate) -> Report {
        report::generate_report(&self.entries, start, end)
    }

    /// Writes the current index.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.persistence.save(&self.entries)?;
        Ok(())
    }

    // ========== Session ==========

    /// Snapshot of the running timer and undo slot.
    pub fn session(&self) -> SessionState {
        SessionState {
            current: self.current.clone(),
            last_deleted: self.last_deleted.clone(),
        }
    }

    /// Reinstates a session saved by an earlier process.
    ///
    /// If the saved timer is also present in the index, the stored copy is
    /// dropped from memory so the timer is held in one place only.
    pub fn restore_session(&mut self, state: SessionState) {
        if let Some(current) = &state.current {
            take(&mut self.entries, current.date(), current.id());
        }
        self.current = state.current;
        self.last_deleted = state.last_deleted;
    }

    /// Saves `entries` and, only once that succeeded, makes them the index.
    fn commit(&mut self, entries: EntryMap) -> Result<(), StoreError> {
        self.persistence.save(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

fn position(entries: &EntryMap, date: NaiveDate, id: IntervalId) -> Option<usize> {
    entries
        .get(&date)
        .and_then(|bucket| bucket.iter().position(|e| e.id() == id))
}

fn insert(entries: &mut EntryMap, interval: Interval) {
    entries.entry(interval.date()).or_default().push(interval);
}

fn take(entries: &mut EntryMap, date: NaiveDate, id: IntervalId) -> Option<Interval> {
    let position = position(entries, date, id)?;
    let bucket = entries.get_mut(&date)?;
    let removed = bucket.remove(position);
    if bucket.is_empty() {
        entries.remove(&date);
    }
    Some(removed)
}
