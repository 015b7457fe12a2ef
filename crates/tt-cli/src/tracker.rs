//! Opening the entry store for a single CLI invocation.
//!
//! Each `tt` run loads the entry file, reinstates the session left by the
//! previous run, and writes the session back after a mutating command.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tt_core::{AccountingMode, EntryStore};
use tt_db::JsonFileStorage;

pub type Store = EntryStore<JsonFileStorage>;

/// Opens the store at `path`, reporting load problems on `warnings`.
pub fn open<W: Write>(path: &Path, mode: AccountingMode, warnings: &mut W) -> Result<Store> {
    let mut store = EntryStore::open(JsonFileStorage::new(path)).with_mode(mode);

    for warning in store.load_warnings() {
        tracing::warn!(%warning, "entry file not loaded");
        writeln!(warnings, "Warning: {warning}")?;
    }

    let session_file = store.persistence().session_file();
    match session_file.load() {
        Ok(session) => store.restore_session(session),
        Err(err) => {
            tracing::warn!(%err, "ignoring session file");
            writeln!(warnings, "Warning: {err}; running timer and undo were reset")?;
        }
    }

    Ok(store)
}

/// Writes the running timer and undo slot for the next invocation.
pub fn save_session(store: &Store) -> Result<()> {
    let session_file = store.persistence().session_file();
    session_file
        .save(&store.session())
        .with_context(|| format!("failed to save session to {}", session_file.path().display()))
}
