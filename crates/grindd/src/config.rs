//! Configuration management for grindd.
//!
//! Read from environment variables, falling back to development defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `SECRET` | `changeme` |
//! | `GRINDD_BIND` | `0.0.0.0:5005` |
//! | `GRINDD_STATE_FILE` | `config.json` |
//! | `GRINDD_WHITELIST` | `example.com,openai.com` |

use anyhow::{Context, Result};
use grind_common::DEFAULT_WHITELIST;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_SECRET: &str = "SECRET";
pub const ENV_BIND: &str = "GRINDD_BIND";
pub const ENV_STATE_FILE: &str = "GRINDD_STATE_FILE";
pub const ENV_WHITELIST: &str = "GRINDD_WHITELIST";

pub const DEFAULT_SECRET: &str = "changeme";
pub const DEFAULT_BIND: &str = "0.0.0.0:5005";
pub const DEFAULT_STATE_FILE: &str = "config.json";

#[derive(Clone)]
pub struct DaemonConfig {
    /// Admin bearer secret
    pub secret: String,
    pub bind_addr: SocketAddr,
    /// Where the configuration record is persisted
    pub state_file: PathBuf,
    /// Whitelist of the default record
    pub seed_whitelist: Vec<String>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset,
    /// except for the whitelist where an empty value means "no seed domains".
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = non_empty(ENV_SECRET).unwrap_or_else(|| DEFAULT_SECRET.to_string());

        let bind = non_empty(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("{} is not a socket address: {}", ENV_BIND, bind))?;

        let state_file = non_empty(ENV_STATE_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        let seed_whitelist = match lookup(ENV_WHITELIST) {
            Some(list) => parse_whitelist(&list),
            None => DEFAULT_WHITELIST.iter().map(|d| d.to_string()).collect(),
        };

        Ok(Self {
            secret,
            bind_addr,
            state_file,
            seed_whitelist,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5005)),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            seed_whitelist: DEFAULT_WHITELIST.iter().map(|d| d.to_string()).collect(),
        }
    }
}

// Keeps the secret out of logs
impl fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("secret", &"***")
            .field("bind_addr", &self.bind_addr)
            .field("state_file", &self.state_file)
            .field("seed_whitelist", &self.seed_whitelist)
            .finish()
    }
}

fn parse_whitelist(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}
