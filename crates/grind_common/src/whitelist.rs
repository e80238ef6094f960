//! Whitelist matching, as enforced by blocking clients during grind mode.

use crate::record::{ConfigRecord, Mode};

/// Strip the scheme and trailing slash admins sometimes paste into entries
pub fn clean_domain(entry: &str) -> &str {
    let entry = entry.trim();
    let entry = entry
        .strip_prefix("https://")
        .or_else(|| entry.strip_prefix("http://"))
        .unwrap_or(entry);
    entry.strip_suffix('/').unwrap_or(entry)
}

/// `host` matches `entry` exactly or as a subdomain of it
pub fn host_matches(host: &str, entry: &str) -> bool {
    let domain = clean_domain(entry).to_ascii_lowercase();
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}

pub fn is_whitelisted(whitelist: &[String], host: &str) -> bool {
    whitelist.iter().any(|entry| host_matches(host, entry))
}

impl ConfigRecord {
    /// Whether a client should let traffic to `host` through
    pub fn allows_host(&self, host: &str) -> bool {
        match self.mode {
            Mode::Chill => true,
            Mode::Grind => is_whitelisted(&self.whitelist, host),
        }
    }
}
