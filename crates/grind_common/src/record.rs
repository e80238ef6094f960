//! The persisted configuration record.
//!
//! Exactly one `ConfigRecord` exists per deployment. Its JSON layout is the
//! wire format served by the daemon:
//!
//! ```json
//! {"mode": "grind", "whitelist": ["example.com"], "until": "2026-01-01T12:00:00.000000Z", "client_initiated": false}
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Seed whitelist used by the default record
pub const DEFAULT_WHITELIST: &[&str] = &["example.com", "openai.com"];

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unrestricted
    #[default]
    Chill,
    /// Focus mode, only whitelisted domains allowed
    Grind,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chill => "chill",
            Mode::Grind => "grind",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "chill" => Some(Mode::Chill),
            "grind" => Some(Mode::Grind),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub mode: Mode,

    #[serde(default)]
    pub whitelist: Vec<String>,

    /// End of the grind period. Kept as the raw stored string so a malformed
    /// value can be detected and cleared by the read path. A stored value of
    /// the wrong JSON type is kept as its JSON text, which never parses.
    #[serde(default, deserialize_with = "deserialize_until")]
    pub until: Option<String>,

    #[serde(default)]
    pub client_initiated: bool,
}

impl ConfigRecord {
    /// Chill record with the given whitelist
    pub fn with_whitelist(whitelist: Vec<String>) -> Self {
        Self {
            mode: Mode::Chill,
            whitelist,
            until: None,
            client_initiated: false,
        }
    }

    pub fn is_grind(&self) -> bool {
        self.mode == Mode::Grind
    }

    /// Parsed `until`, `None` when absent or malformed
    pub fn until_instant(&self) -> Option<DateTime<Utc>> {
        self.until.as_deref().and_then(parse_timestamp)
    }

    /// Switch to grind mode. `until = None` means indefinite.
    pub fn enter_grind(&mut self, until: Option<DateTime<Utc>>, client_initiated: bool) {
        self.mode = Mode::Grind;
        self.until = until.map(format_timestamp);
        self.client_initiated = client_initiated;
    }

    /// Switch to chill mode, dropping the grind-only fields
    pub fn enter_chill(&mut self) {
        self.mode = Mode::Chill;
        self.until = None;
        self.client_initiated = false;
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self::with_whitelist(DEFAULT_WHITELIST.iter().map(|d| d.to_string()).collect())
    }
}

fn deserialize_until<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(raw),
        Some(other) => Some(other.to_string()),
    })
}

/// Format a timestamp the way records store it (RFC 3339, UTC, `Z` suffix)
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset, plus naive ISO-8601 date-times and bare
/// dates, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
