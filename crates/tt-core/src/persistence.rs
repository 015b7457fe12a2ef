//! The seam between the entry store and durable storage.

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::{self, EntryMap};

/// Errors writing entries to durable storage.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error while writing.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The entry map could not be encoded.
    #[error("failed to encode entries: {0}")]
    Encode(#[from] serde_json::Error),
    /// The file on disk was neither loaded nor moved aside, so it is not
    /// written over.
    #[error("refusing to overwrite {path}: the existing file could not be loaded")]
    Protected { path: PathBuf },
}

/// A recoverable problem found while loading entries.
///
/// The store starts empty when one of these is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The file exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
    /// The file was read but is not a valid entry document.
    Corrupt {
        path: PathBuf,
        reason: String,
        backup: Option<PathBuf>,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, reason } => {
                write!(f, "could not read {}: {reason}", path.display())
            }
            Self::Corrupt {
                path,
                reason,
                backup,
            } => {
                write!(f, "ignoring corrupt entry file {}: {reason}", path.display())?;
                if let Some(backup) = backup {
                    write!(f, " (moved to {})", backup.display())?;
                }
                Ok(())
            }
        }
    }
}

/// Result of loading entries.
#[derive(Debug, Default)]
pub struct Loaded {
    pub entries: EntryMap,
    pub warnings: Vec<LoadWarning>,
}

impl Loaded {
    pub const fn clean(entries: EntryMap) -> Self {
        Self {
            entries,
            warnings: Vec::new(),
        }
    }
}

/// Durable storage for the entry map.
///
/// Loading never fails: a missing store is empty, and an unreadable or corrupt
/// one is reported as a [`LoadWarning`] alongside an empty map. A save after
/// such a load must not destroy the data that failed to load.
pub trait Persistence {
    fn load(&self) -> Loaded;

    fn save(&self, entries: &EntryMap) -> Result<(), PersistError>;
}

impl<P: Persistence + ?Sized> Persistence for &P {
    fn load(&self) -> Loaded {
        (**self).load()
    }

    fn save(&self, entries: &EntryMap) -> Result<(), PersistError> {
        (**self).save(entries)
    }
}

/// In-process storage holding the last encoded document.
///
/// Goes through the same codec as file storage, so it observes exactly what
/// would have been written.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RefCell<Option<String>>,
    saves: RefCell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document, as if read from disk.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: RefCell::new(Some(document.into())),
            saves: RefCell::new(0),
        }
    }

    /// The most recently saved document.
    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Loaded {
        let Some(document) = self.document.borrow().clone() else {
            return Loaded::default();
        };
        match codec::decode(&document) {
            Ok(entries) => Loaded::clean(entries),
            Err(err) => Loaded {
                entries: EntryMap::new(),
                warnings: vec![LoadWarning::Corrupt {
                    path: PathBuf::from("<memory>"),
                    reason: err.to_string(),
                    backup: None,
                }],
            },
        }
    }

    fn save(&self, entries: &EntryMap) -> Result<(), PersistError> {
        let document = codec::encode(entries)?;
        *self.document.borrow_mut() = Some(document);
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::index;
    use crate::interval::fixtures::{day, work};

    #[test]
    fn test_memory_storage_starts_empty() {
        let storage = MemoryStorage::new();
        let loaded = storage.load();
        assert!(loaded.entries.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_memory_storage_round_trips_entries() {
        let storage = MemoryStorage::new();
        let entries = index([work(day(2025, 11, 12), (8, 0), (12, 0), "Review")]);
        storage.save(&entries).unwrap();
        assert_eq!(storage.save_count(), 1);
        assert_eq!(storage.load().entries, entries);
    }

    #[test]
    fn test_memory_storage_reports_corrupt_document() {
        let storage = MemoryStorage::with_document("not json");
        let loaded = storage.load();
        assert!(loaded.entries.is_empty());
        assert!(matches!(loaded.warnings[..], [LoadWarning::Corrupt { .. }]));
    }
}
