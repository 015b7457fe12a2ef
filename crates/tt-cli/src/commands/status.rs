//! Status command for showing the running timer and today's total.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use tt_core::report::NO_DESCRIPTION;
use tt_core::{EntryStore, Persistence};

use super::util::format_duration;

pub fn run<P: Persistence, W: Write>(
    writer: &mut W,
    store: &EntryStore<P>,
    storage_path: &Path,
    now: NaiveDateTime,
) -> Result<()> {
    writeln!(writer, "Time tracker status")?;
    writeln!(writer, "Storage: {}", storage_path.display())?;

    match (store.current(), store.elapsed_at(now)) {
        (Some(current), Some(elapsed)) => {
            let description = if current.description().is_empty() {
                NO_DESCRIPTION
            } else {
                current.description()
            };
            writeln!(
                writer,
                "Running: {description} since {} ({})",
                current.start().format("%Y-%m-%d %H:%M:%S"),
                format_duration(elapsed)
            )?;
        }
        _ => writeln!(writer, "No timer running.")?,
    }

    let today = now.date();
    writeln!(
        writer,
        "Worked today: {}",
        format_duration(store.total_worked_for_date(today))
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use tt_core::{Interval, MemoryStorage};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn render(store: &EntryStore<MemoryStorage>, now: NaiveDateTime) -> String {
        let mut output = Vec::new();
        run(&mut output, store, Path::new("[TEMP]/timedata.json"), now).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_status_without_timer() {
        let mut store = EntryStore::open(MemoryStorage::new());
        store
            .add_manual_entry(Interval::new(at(8, 0), at(9, 15), "Mail", false).unwrap())
            .unwrap();

        assert_snapshot!(render(&store, at(12, 0)), @r"
        Time tracker status
        Storage: [TEMP]/timedata.json
        No timer running.
        Worked today: 01:15:00
        ");
    }

    #[test]
    fn test_status_with_running_timer() {
        let mut store = EntryStore::open(MemoryStorage::new());
        store.start_timer_at("Coding", at(9, 0)).unwrap();

        assert_snapshot!(render(&store, at(10, 5)), @r"
        Time tracker status
        Storage: [TEMP]/timedata.json
        Running: Coding since 2025-11-10 09:00:00 (01:05:00)
        Worked today: 00:00:00
        ");
    }
}
