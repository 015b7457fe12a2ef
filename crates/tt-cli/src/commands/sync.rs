//! Sync command for pushing entries to and pulling them from the web companion.

use std::fmt;
use std::io::Write;

use anyhow::{Context, Result};
use tt_core::{EntryStore, Persistence};
use tt_remote::{RemoteClient, SyncDirection, SyncError, SyncSummary};

use crate::Config;
use crate::cli::SyncArgs;

/// Server and credentials, flags first then configuration.
pub struct Credentials {
    pub server_url: String,
    pub username: String,
    pin: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("pin", &"[REDACTED]")
            .finish()
    }
}

fn pick(flag: Option<&str>, configured: Option<&str>, name: &str) -> Result<String> {
    flag.or(configured)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .with_context(|| {
            format!(
                "missing {name}: pass --{} or set {name} in the config",
                name.replace('_', "-")
            )
        })
}

impl Credentials {
    pub fn resolve(args: &SyncArgs, config: &Config) -> Result<Self> {
        Ok(Self {
            server_url: pick(args.server_url.as_deref(), config.server_url.as_deref(), "server_url")?,
            username: pick(args.username.as_deref(), config.username.as_deref(), "username")?,
            pin: pick(args.pin.as_deref(), config.pin.as_deref(), "pin")?,
        })
    }
}

pub fn run<P: Persistence, W: Write>(
    writer: &mut W,
    store: &mut EntryStore<P>,
    credentials: &Credentials,
    direction: SyncDirection,
) -> Result<SyncSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let summary = runtime
        .block_on(async {
            let client = RemoteClient::new(credentials.server_url.as_str())?;
            client.login(&credentials.username, &credentials.pin).await?;
            tracing::debug!(server = client.base_url(), %direction, "logged in");
            let summary = tt_remote::sync(&client, store, direction).await?;
            Ok::<_, SyncError>(summary)
        })
        .with_context(|| format!("sync with {} failed", credentials.server_url))?;

    if let Some(pushed) = summary.pushed {
        writeln!(writer, "Pushed {pushed} entries to {}", credentials.server_url)?;
    }
    if let Some(pulled) = summary.pulled {
        writeln!(writer, "Pulled {pulled} entries from {}", credentials.server_url)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(server_url: Option<&str>, username: Option<&str>, pin: Option<&str>) -> SyncArgs {
        SyncArgs {
            direction: SyncDirection::Both,
            server_url: server_url.map(String::from),
            username: username.map(String::from),
            pin: pin.map(String::from),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            server_url: Some("http://config:5000".to_string()),
            username: Some("ana".to_string()),
            pin: Some("1111".to_string()),
            ..Config::default()
        };
        let creds =
            Credentials::resolve(&args(Some("http://flag:5000"), None, Some("2222")), &config).unwrap();
        assert_eq!(creds.server_url, "http://flag:5000");
        assert_eq!(creds.username, "ana");
        assert_eq!(creds.pin, "2222");
    }

    #[test]
    fn test_missing_credentials_are_an_error() {
        let err = Credentials::resolve(&args(Some("http://x"), Some("ana"), None), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("missing pin"));

        let err = Credentials::resolve(&args(None, Some(" "), Some("1")), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("missing server_url"));
    }

    #[test]
    fn test_invalid_server_url_fails_before_network() {
        let creds = Credentials {
            server_url: "not a url".to_string(),
            username: "ana".to_string(),
            pin: "1234".to_string(),
        };
        let mut store = EntryStore::open(tt_core::MemoryStorage::new());
        let err = run(&mut Vec::new(), &mut store, &creds, SyncDirection::Pull).unwrap_err();
        assert!(format!("{err:#}").contains("sync with not a url failed"));
    }
}
