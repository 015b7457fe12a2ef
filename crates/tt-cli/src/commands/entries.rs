//! Entry commands: `tt list`, `tt add`, `tt edit`, `tt delete`, `tt undo`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tt_core::report::row_label;
use tt_core::{EntryStore, Interval, Persistence};

use super::entry_at;
use super::util::{format_duration, parse_timestamp};

/// Prints the day's entries with 1-based indices and the worked total.
pub fn list<P: Persistence, W: Write>(
    writer: &mut W,
    store: &EntryStore<P>,
    date: NaiveDate,
) -> Result<()> {
    let entries = store.entries_for_date(date);
    if entries.is_empty() {
        writeln!(writer, "No entries on {date}.")?;
        return Ok(());
    }

    writeln!(writer, "Entries on {date}:")?;
    for (i, entry) in entries.iter().enumerate() {
        writeln!(writer, "{:>3}. {}", i + 1, describe(entry))?;
    }
    writeln!(
        writer,
        "Worked: {} ({})",
        format_duration(store.total_worked_for_date(date)),
        store.mode()
    )?;
    Ok(())
}

/// Manual entry input as typed by the user.
#[derive(Debug)]
pub struct NewEntry<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub description: &'a str,
    pub is_absence: bool,
}

pub fn add<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    entry: &NewEntry<'_>,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<()> {
    let start = parse_timestamp(entry.start, date, now)?;
    let end = parse_timestamp(entry.end, date, now)?;
    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    let interval = Interval::new(start, end, entry.description.trim(), entry.is_absence)?;
    let line = describe(&interval);
    store
        .add_manual_entry(interval)
        .context("failed to save entry")?;
    writeln!(writer, "Added {line}")?;
    Ok(())
}

/// Fields to change on an existing entry; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct EntryChanges<'a> {
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_absence: Option<bool>,
}

pub fn edit<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    date: NaiveDate,
    index: usize,
    changes: &EntryChanges<'_>,
    now: NaiveDateTime,
) -> Result<()> {
    let old = entry_at(store.entries_for_date(date), index, date)?.clone();

    let start = changes
        .start
        .map_or(Ok(old.start()), |s| parse_timestamp(s, date, now))?;
    let end = changes
        .end
        .map_or(Ok(old.end()), |s| parse_timestamp(s, date, now))?;
    let description = changes
        .description
        .map_or_else(|| old.description().to_string(), |d| d.trim().to_string());
    let is_absence = changes.is_absence.unwrap_or(old.is_absence());

    let new = old.edited(start, end, description, is_absence)?;
    let line = describe(&new);
    store
        .update_entry(&old, new)
        .context("failed to update entry")?;
    writeln!(writer, "Updated {line}")?;
    Ok(())
}

pub fn delete<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    date: NaiveDate,
    index: usize,
) -> Result<()> {
    let target = entry_at(store.entries_for_date(date), index, date)?.clone();
    let removed = store
        .delete_entry(&target)
        .context("failed to delete entry")?;
    writeln!(writer, "Deleted {} (undo with `tt undo`)", describe(&removed))?;
    Ok(())
}

pub fn undo<P: Persistence, W: Write>(writer: &mut W, store: &mut EntryStore<P>) -> Result<()> {
    let pending = store.last_deleted().map(describe);
    if !store.undo_delete().context("failed to restore entry")? {
        anyhow::bail!("Nothing to undo");
    }
    if let Some(line) = pending {
        writeln!(writer, "Restored {line}")?;
    }
    Ok(())
}

fn describe(entry: &Interval) -> String {
    let date_prefix = if entry.end().date() == entry.date() {
        String::new()
    } else {
        format!("{} ", entry.end().date())
    };
    format!(
        "{} - {}{}  {}  {}",
        entry.start().format("%H:%M:%S"),
        date_prefix,
        entry.end().format("%H:%M:%S"),
        format_duration(entry.duration()),
        row_label(entry)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use tt_core::MemoryStorage;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn noon() -> NaiveDateTime {
        day().and_hms_opt(12, 0, 0).unwrap()
    }

    fn add_entry(store: &mut EntryStore<MemoryStorage>, start: &str, end: &str, desc: &str, is_absence: bool) {
        let entry = NewEntry {
            start,
            end,
            description: desc,
            is_absence,
        };
        add(&mut Vec::new(), store, &entry, day(), noon()).unwrap();
    }

    fn listing(store: &EntryStore<MemoryStorage>) -> String {
        let mut out = Vec::new();
        list(&mut out, store, day()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_shows_indices_labels_and_worked_total() {
        let mut store = EntryStore::open(MemoryStorage::new());
        add_entry(&mut store, "09:00", "13:00", "Coding", false);
        add_entry(&mut store, "12:00", "14:00", "Doctor", true);
        add_entry(&mut store, "15:00", "15:30", "", false);

        assert_snapshot!(listing(&store), @r"
        Entries on 2025-11-10:
          1. 09:00:00 - 13:00:00  04:00:00  Coding
          2. 12:00:00 - 14:00:00  02:00:00  🏖 Absence: Doctor
          3. 15:00:00 - 15:30:00  00:30:00  (no description)
        Worked: 03:30:00 (overlap)
        ");
    }

    #[test]
    fn test_list_empty_day() {
        let store = EntryStore::open(MemoryStorage::new());
        assert_eq!(listing(&store), "No entries on 2025-11-10.\n");
    }

    #[test]
    fn test_add_rejects_end_not_after_start() {
        let mut store = EntryStore::open(MemoryStorage::new());
        let entry = NewEntry {
            start: "10:00",
            end: "10:00",
            description: "",
            is_absence: false,
        };
        let err = add(&mut Vec::new(), &mut store, &entry, day(), noon()).unwrap_err();
        assert!(err.to_string().contains("after start"));
        assert_eq!(store.persistence().save_count(), 0);
    }

    #[test]
    fn test_add_with_relative_times() {
        let mut store = EntryStore::open(MemoryStorage::new());
        add_entry(&mut store, "2 hours ago", "now", "Review", false);
        let entry = &store.entries_for_date(day())[0];
        assert_eq!(entry.start(), day().and_hms_opt(10, 0, 0).unwrap());
        assert_eq!(entry.end(), noon());
    }

    #[test]
    fn test_edit_changes_only_given_fields() {
        let mut store = EntryStore::open(MemoryStorage::new());
        add_entry(&mut store, "09:00", "10:00", "Coding", false);
        add_entry(&mut store, "10:00", "11:00", "Mail", false);
        let id = store.entries_for_date(day())[0].id();

        let changes = EntryChanges {
            end: Some("10:30"),
            description: Some("Pairing"),
            ..EntryChanges::default()
        };
        edit(&mut Vec::new(), &mut store, day(), 1, &changes, noon()).unwrap();

        let entries = store.entries_for_date(day());
        assert_eq!(entries[0].id(), id);
        assert_eq!(entries[0].description(), "Pairing");
        assert_eq!(entries[0].start(), day().and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(entries[0].end(), day().and_hms_opt(10, 30, 0).unwrap());
        assert_eq!(entries[1].description(), "Mail");
    }

    #[test]
    fn test_edit_rejects_inverted_span() {
        let mut store = EntryStore::open(MemoryStorage::new());
        add_entry(&mut store, "09:00", "10:00", "Coding", false);
        let changes = EntryChanges {
            start: Some("11:00"),
            ..EntryChanges::default()
        };
        assert!(edit(&mut Vec::new(), &mut store, day(), 1, &changes, noon()).is_err());
        assert!(edit(&mut Vec::new(), &mut store, day(), 2, &EntryChanges::default(), noon()).is_err());
    }

    #[test]
    fn test_delete_then_undo() {
        let mut store = EntryStore::open(MemoryStorage::new());
        add_entry(&mut store, "09:00", "10:00", "Coding", false);

        let mut out = Vec::new();
        delete(&mut out, &mut store, day(), 1).unwrap();
        assert!(store.entries_for_date(day()).is_empty());
        undo(&mut out, &mut store).unwrap();
        assert_eq!(store.entries_for_date(day()).len(), 1);

        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Deleted 09:00:00 - 10:00:00  01:00:00  Coding (undo with `tt undo`)
        Restored 09:00:00 - 10:00:00  01:00:00  Coding
        ");
        assert!(undo(&mut Vec::new(), &mut store).is_err());
    }
}
