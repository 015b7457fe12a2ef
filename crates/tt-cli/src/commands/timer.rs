//! Timer commands: `tt start`, `tt stop`, `tt resume`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tt_core::{EntryStore, Persistence};

use super::util::format_duration;

pub fn start<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    description: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let live = store
        .start_timer_at(description.trim(), now)
        .context("cannot start timer")?;
    writeln!(
        writer,
        "Started {} at {}",
        label(live.description()),
        live.start().format("%H:%M:%S")
    )?;
    Ok(())
}

pub fn stop<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    now: NaiveDateTime,
) -> Result<()> {
    let stopped = store.stop_timer_at(now).context("cannot stop timer")?;
    writeln!(
        writer,
        "Stopped {} after {}",
        label(stopped.description()),
        format_duration(stopped.duration())
    )?;
    Ok(())
}

/// Resumes entry `index` (1-based) on `date`, or the day's last entry.
pub fn resume<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    date: chrono::NaiveDate,
    index: Option<usize>,
) -> Result<()> {
    let entries = store.entries_for_date(date);
    let target = match index {
        Some(index) => super::entry_at(entries, index, date)?,
        None => entries
            .last()
            .with_context(|| format!("no entries on {date} to resume"))?,
    }
    .clone();

    store.resume_entry(&target).context("cannot resume entry")?;
    // The resumed entry leaves the file now; stop files it again.
    store.persist().context("failed to save entries")?;

    writeln!(
        writer,
        "Resumed {} from {}",
        label(target.description()),
        target.start().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(())
}

fn label(description: &str) -> String {
    if description.is_empty() {
        "timer".to_string()
    } else {
        format!("'{description}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use tt_core::{Interval, MemoryStorage};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_start_and_stop_report_what_happened() {
        let mut store = EntryStore::open(MemoryStorage::new());
        let mut out = Vec::new();
        start(&mut out, &mut store, "  Coding ", at(9, 0)).unwrap();
        stop(&mut out, &mut store, at(10, 30)).unwrap();

        assert_snapshot!(output(out), @r"
        Started 'Coding' at 09:00:00
        Stopped 'Coding' after 01:30:00
        ");
        assert_eq!(store.entries_for_date(day())[0].description(), "Coding");
    }

    #[test]
    fn test_start_while_running_fails() {
        let mut store = EntryStore::open(MemoryStorage::new());
        start(&mut Vec::new(), &mut store, "", at(9, 0)).unwrap();
        let err = start(&mut Vec::new(), &mut store, "", at(9, 1)).unwrap_err();
        assert!(format!("{err:#}").contains("timer already running"));
    }

    #[test]
    fn test_stop_without_timer_fails() {
        let mut store = EntryStore::open(MemoryStorage::new());
        let err = stop(&mut Vec::new(), &mut store, at(9, 0)).unwrap_err();
        assert!(format!("{err:#}").contains("no timer running"));
    }

    #[test]
    fn test_resume_defaults_to_last_entry_and_persists_removal() {
        let storage = MemoryStorage::new();
        let mut store = EntryStore::open(&storage);
        for (from, to, desc) in [(8, 9, "Mail"), (9, 10, "Coding")] {
            store
                .add_manual_entry(Interval::new(at(from, 0), at(to, 0), desc, false).unwrap())
                .unwrap();
        }

        let mut out = Vec::new();
        resume(&mut out, &mut store, day(), None).unwrap();
        assert_snapshot!(output(out), @"Resumed 'Coding' from 2025-11-10 09:00:00");
        assert_eq!(store.current().unwrap().description(), "Coding");
        assert_eq!(EntryStore::open(&storage).entries_for_date(day()).len(), 1);
    }

    #[test]
    fn test_resume_rejects_bad_index_and_absences() {
        let mut store = EntryStore::open(MemoryStorage::new());
        store
            .add_manual_entry(Interval::new(at(9, 0), at(17, 0), "Vacation", true).unwrap())
            .unwrap();

        assert!(resume(&mut Vec::new(), &mut store, day(), Some(2)).is_err());
        assert!(resume(&mut Vec::new(), &mut store, day(), Some(0)).is_err());
        let err = resume(&mut Vec::new(), &mut store, day(), Some(1)).unwrap_err();
        assert!(format!("{err:#}").contains("absences cannot be resumed"));
        assert!(store.current().is_none());
    }
}
