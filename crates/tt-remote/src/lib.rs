//! Remote sync for the time tracker.
//!
//! Talks to the web companion's persistence API:
//! - `POST /api/auth/login` with `{username, pin}` opens a cookie session
//! - `GET /api/load_entries` returns `{entries: [...]}`
//! - `POST /api/save_entries` replaces the server's entries and returns `{saved}`
//!
//! Sync is replace-only. A pull discards local entries in favour of the
//! server's; a push replaces the server's with the local ones. There is no
//! merge.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tt_core::{EntryStore, Interval, Persistence, StoreError};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const LOGIN_PATH: &str = "/api/auth/login";
const LOAD_PATH: &str = "/api/load_entries";
const SAVE_PATH: &str = "/api/save_entries";
const WIRE_TIME_FORMAT: &str = "%H:%M:%S";
const REMOTE_TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server URL is unusable.
    #[error("invalid server URL: {reason}")]
    InvalidUrl { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Network or HTTP protocol failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server rejected the credentials or the session.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: StatusCode, message: String },
    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    /// The server's response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidPayload(String),
    /// Applying pulled entries to the local store failed.
    #[error("failed to apply remote entries: {0}")]
    Store(#[from] StoreError),
}

/// Which way entries travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncDirection {
    Push,
    Pull,
    /// Push, then pull back what the server stored.
    #[default]
    Both,
}

impl SyncDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unknown sync direction name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid sync direction: {0} (expected push, pull or both)")]
pub struct UnknownDirection(pub String);

impl FromStr for SyncDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "pull" => Ok(Self::Pull),
            "both" => Ok(Self::Both),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

/// An entry as exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub date: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_absence: bool,
}

impl From<&Interval> for RemoteEntry {
    fn from(interval: &Interval) -> Self {
        Self {
            date: interval.date().to_string(),
            start: interval.start().format(WIRE_TIME_FORMAT).to_string(),
            end: interval.end().format(WIRE_TIME_FORMAT).to_string(),
            description: Some(interval.description().to_string()),
            is_absence: interval.is_absence(),
        }
    }
}

impl TryFrom<RemoteEntry> for Interval {
    type Error = SyncError;

    /// Rebuilds an interval from its payload.
    ///
    /// Times may be `HH:MM:SS`, `HH:MM` or full ISO datetimes. A time-only end
    /// earlier than the start is taken to fall on the following day.
    fn try_from(entry: RemoteEntry) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d")
            .map_err(|err| SyncError::InvalidPayload(format!("bad date {:?}: {err}", entry.date)))?;
        let (start, _) = combine(date, &entry.start)?;
        let (mut end, end_is_time_only) = combine(date, &entry.end)?;
        if end < start && end_is_time_only {
            end += chrono::Duration::days(1);
        }
        Self::new(
            start,
            end,
            entry.description.unwrap_or_default(),
            entry.is_absence,
        )
        .map_err(|err| SyncError::InvalidPayload(err.to_string()))
    }
}

/// Joins a remote time with its date; the flag is true for time-only input.
fn combine(date: NaiveDate, value: &str) -> Result<(NaiveDateTime, bool), SyncError> {
    if value.is_empty() {
        return Err(SyncError::InvalidPayload(format!(
            "entry on {date} is missing a time"
        )));
    }
    if let Ok(full) = value.parse::<NaiveDateTime>() {
        return Ok((full, false));
    }
    REMOTE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .map(|time| (date.and_time(time), true))
        .ok_or_else(|| SyncError::InvalidPayload(format!("unable to parse remote time {value:?}")))
}

/// Result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SaveSummary {
    pub saved: usize,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Entries the server reported as saved.
    pub pushed: Option<usize>,
    /// Entries now held locally after a pull.
    pub pulled: Option<usize>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    pin: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveRequest {
    entries: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    #[serde(default)]
    entries: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
}

/// HTTP client for the persistence API.
///
/// Keeps cookies, so a successful [`Self::login`] authenticates later calls.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SyncError::InvalidUrl {
                reason: "server URL cannot be empty",
            });
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SyncError::InvalidUrl {
                reason: "server URL must start with http:// or https://",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(SyncError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Opens a session for `username`.
    pub async fn login(&self, username: &str, pin: &str) -> Result<(), SyncError> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { username, pin })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SyncError::Auth {
                status,
                message: error_message(&body),
            });
        }
        check_status(status, &body)
    }

    /// Fetches every entry stored on the server.
    pub async fn load_entries(&self) -> Result<Vec<Interval>, SyncError> {
        let response = self.http.get(self.url(LOAD_PATH)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;

        let payload: LoadResponse = serde_json::from_str(&body)
            .map_err(|err| SyncError::InvalidPayload(err.to_string()))?;
        payload.entries.into_iter().map(Interval::try_from).collect()
    }

    /// Replaces the server's entries with `entries`.
    pub async fn save_entries(&self, entries: &[Interval]) -> Result<SaveSummary, SyncError> {
        let request = SaveRequest {
            entries: entries.iter().map(RemoteEntry::from).collect(),
        };
        let response = self
            .http
            .post(self.url(SAVE_PATH))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;

        serde_json::from_str(&body).map_err(|err| SyncError::InvalidPayload(err.to_string()))
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), SyncError> {
    if status.is_success() {
        return Ok(());
    }
    let message = error_message(body);
    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Auth { status, message });
    }
    Err(SyncError::Status { status, message })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| body.trim().to_string(), |payload| payload.error)
}

/// Runs a sync against an authenticated client.
///
/// `Both` pushes first and then pulls, so against a replace-on-save server
/// the local store ends up holding exactly what was pushed.
pub async fn sync<P: Persistence>(
    client: &RemoteClient,
    store: &mut EntryStore<P>,
    direction: SyncDirection,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();

    if matches!(direction, SyncDirection::Push | SyncDirection::Both) {
        let local = store.enumerate_all();
        let saved = client.save_entries(&local).await?;
        summary.pushed = Some(saved.saved);
    }

    if matches!(direction, SyncDirection::Pull | SyncDirection::Both) {
        let remote = client.load_entries().await?;
        let count = remote.len();
        store.replace_all(remote)?;
        summary.pulled = Some(count);
    }

    Ok(summary)
}
