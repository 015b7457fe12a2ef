//! Storage layer for the time tracker.
//!
//! Persists the entry document as a single JSON file and keeps the CLI
//! session (running timer, undo slot) in a sidecar file next to it.
//!
//! # Write discipline
//!
//! Every save writes the full document to a temporary file in the target
//! directory, syncs it, and renames it over the previous file. A crash during
//! a save leaves either the old or the new document, never a partial one.
//!
//! # Corrupt files
//!
//! A document that cannot be decoded (including one that is not UTF-8) is
//! moved aside to `<name>.corrupt-<timestamp>` before the store starts empty,
//! so the next save cannot overwrite the only copy of the data. When the file
//! can be neither read nor moved aside, the storage refuses every save with
//! [`PersistError::Protected`].
//!
//! # Thread Safety
//!
//! There is no locking between processes. Two `tt` invocations writing at the
//! same time race, and the last rename wins.

use std::cell::Cell;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tt_core::{EntryMap, LoadWarning, Loaded, PersistError, Persistence, SessionState, codec};

/// Storage errors outside the entry document itself.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A sidecar file could not be parsed.
    #[error("invalid session file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The session could not be encoded.
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Entry document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    /// Set when a load left unloaded data at `path`.
    protected: Cell<bool>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: Cell::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file holding the session for this document.
    pub fn session_file(&self) -> SessionFile {
        SessionFile::new(sibling(&self.path, ".session.json"))
    }

    fn quarantine(&self) -> Option<PathBuf> {
        let stamp = Local::now().format("%Y%m%dT%H%M%S");
        let backup = sibling(&self.path, &format!(".corrupt-{stamp}"));
        match fs::rename(&self.path, &backup) {
            Ok(()) => Some(backup),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "failed to move corrupt entry file aside");
                None
            }
        }
    }
}

impl Persistence for JsonFileStorage {
    fn load(&self) -> Loaded {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no entry file yet");
                return Loaded::default();
            }
            Err(err) => {
                // Left in place; saves are refused until a later run can read it.
                self.protected.set(true);
                return Loaded {
                    entries: EntryMap::new(),
                    warnings: vec![LoadWarning::Unreadable {
                        path: self.path.clone(),
                        reason: err.to_string(),
                    }],
                };
            }
        };

        let decoded = std::str::from_utf8(&bytes)
            .map_err(|err| err.to_string())
            .and_then(|contents| codec::decode(contents).map_err(|err| err.to_string()));
        match decoded {
            Ok(entries) => {
                tracing::debug!(path = %self.path.display(), dates = entries.len(), "loaded entries");
                Loaded::clean(entries)
            }
            Err(reason) => {
                let backup = self.quarantine();
                if backup.is_none() {
                    self.protected.set(true);
                }
                Loaded {
                    entries: EntryMap::new(),
                    warnings: vec![LoadWarning::Corrupt {
                        path: self.path.clone(),
                        reason,
                        backup,
                    }],
                }
            }
        }
    }

    fn save(&self, entries: &EntryMap) -> Result<(), PersistError> {
        if self.protected.get() {
            return Err(PersistError::Protected {
                path: self.path.clone(),
            });
        }
        let document = codec::encode(entries)?;
        write_atomic(&self.path, document.as_bytes()).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), dates = entries.len(), "saved entries");
        Ok(())
    }
}

/// Sidecar file with the running timer and undo slot.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the session; a missing file is an empty session.
    pub fn load(&self) -> Result<SessionState, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SessionState::default()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Writes the session, removing the file when there is nothing to keep.
    pub fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        if state.current.is_none() && state.last_deleted.is_none() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                }),
            };
        }
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Path next to `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("timedata.json"), OsString::from);
    name.push(suffix);
    path.with_file_name(name)
}

/// Replaces `path` with `contents` via a synced temporary file and rename.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
