//! CLI subcommand implementations.

use anyhow::Result;
use chrono::NaiveDate;
use tt_core::Interval;

pub mod entries;
pub mod report;
pub mod status;
pub mod sync;
pub mod timer;
pub mod util;

/// Entry number `index` (1-based, as printed by `tt list`) on `date`.
fn entry_at(entries: &[Interval], index: usize, date: NaiveDate) -> Result<&Interval> {
    index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No entry #{index} on {date} ({} entries; see `tt list --date {date}`)",
                entries.len()
            )
        })
}
