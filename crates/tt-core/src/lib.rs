//! Core domain logic for the time tracker.
//!
//! This crate contains the entry accounting engine:
//! - Intervals: recorded work and absence spans
//! - Overlap accounting: worked time per day with absence subtraction
//! - Entry store: timer, edits, delete/undo over a date-indexed map
//! - Reports: hours per description and date
//! - Codec: the JSON entry document

pub mod codec;
mod interval;
pub mod overlap;
mod persistence;
pub mod report;
mod store;

pub use codec::{CodecError, EntryMap};
pub use interval::{Interval, IntervalError, IntervalId};
pub use overlap::{AccountingMode, UnknownAccountingMode};
pub use persistence::{LoadWarning, Loaded, MemoryStorage, PersistError, Persistence};
pub use report::{Report, ReportRow};
pub use store::{EntryStore, SessionState, StoreError};
