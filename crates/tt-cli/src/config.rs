//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tt_core::AccountingMode;

/// File name of the entry document.
const STORAGE_FILE_NAME: &str = "timedata.json";

/// Application configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to the entry file. Discovered when unset.
    pub storage_path: Option<PathBuf>,

    /// How worked totals treat absences.
    pub accounting: AccountingMode,

    /// Base URL of the web companion for `tt sync`.
    pub server_url: Option<String>,

    pub username: Option<String>,

    pub pin: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("storage_path", &self.storage_path)
            .field("accounting", &self.accounting)
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Loads configuration from the default locations, or from `config_path`
    /// when one is given.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TT_*)
        figment = figment.merge(Env::prefixed("TT_"));

        figment.extract()
    }

    /// Picks the entry file: explicit flag, then config, then discovery.
    pub fn resolve_storage_path(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag {
            return path.to_path_buf();
        }
        if let Some(path) = &self.storage_path {
            return path.clone();
        }
        discover_storage_path(&storage_candidates())
    }
}

/// Known entry file locations, in preference order.
///
/// The first is the platform default; the others are older home-directory
/// layouts still honoured when present.
pub fn storage_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(data_dir) = dirs_data_path() {
        candidates.push(data_dir.join(STORAGE_FILE_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".timetracker").join(STORAGE_FILE_NAME));
        candidates.push(
            home.join(".timetracker")
                .join("data")
                .join(STORAGE_FILE_NAME),
        );
    }
    candidates
}

/// First existing candidate, else the first candidate, else the working directory.
fn discover_storage_path(candidates: &[PathBuf]) -> PathBuf {
    candidates
        .iter()
        .find(|p| p.exists())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(STORAGE_FILE_NAME))
}

/// Returns the platform-specific config directory for tt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tt"))
}

/// Returns the platform-specific data directory for tt.
///
/// On Linux: `~/.local/share/tt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tt"))
}
