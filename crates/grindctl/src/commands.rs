//! Command handlers for grindctl

use crate::client::GrindClient;
use crate::output::render_record;
use anyhow::{bail, Result};
use chrono::Utc;
use grind_common::{ConfigPatch, ConfigRecord};
use owo_colors::OwoColorize;
use reqwest::Url;

pub async fn status(client: &GrindClient) -> Result<()> {
    let record = client.get_config().await?;
    print!("{}", render_record(&record, Utc::now()));
    Ok(())
}

/// Client-side grind: can be started, never stopped
pub async fn grind(client: &GrindClient, hours: Option<i64>) -> Result<()> {
    let record = client.client_grind(hours).await?;
    println!("{}", "Grind mode started. Only an admin or the timer can end it.".bold());
    print!("{}", render_record(&record, Utc::now()));
    Ok(())
}

pub async fn admin_chill(client: &GrindClient) -> Result<()> {
    apply(client, &ConfigPatch::chill()).await
}

pub async fn admin_grind(client: &GrindClient, hours: i64) -> Result<()> {
    apply(client, &ConfigPatch::grind(hours)).await
}

pub async fn whitelist_set(client: &GrindClient, domains: Vec<String>) -> Result<()> {
    apply(client, &ConfigPatch::whitelist(domains)).await
}

pub async fn whitelist_add(client: &GrindClient, domain: &str) -> Result<()> {
    let current = client.get_config().await?;
    match with_domain_added(&current.whitelist, domain) {
        Some(whitelist) => apply(client, &ConfigPatch::whitelist(whitelist)).await,
        None => {
            println!("{} is already whitelisted", domain);
            Ok(())
        }
    }
}

pub async fn whitelist_remove(client: &GrindClient, domain: &str) -> Result<()> {
    let current = client.get_config().await?;
    match with_domain_removed(&current.whitelist, domain) {
        Some(whitelist) => apply(client, &ConfigPatch::whitelist(whitelist)).await,
        None => bail!("{} is not in the whitelist", domain),
    }
}

/// Report whether `target` would be reachable right now
pub async fn check(client: &GrindClient, target: &str) -> Result<()> {
    let host = host_of(target)?;
    let record = client.get_config().await?;
    println!("{}", describe_access(&record, &host));
    Ok(())
}

async fn apply(client: &GrindClient, patch: &ConfigPatch) -> Result<()> {
    let record = client.admin_update(patch).await?;
    println!("{}", "Updated.".green());
    print!("{}", render_record(&record, Utc::now()));
    Ok(())
}

/// Whitelist with `domain` appended, `None` if already present
pub fn with_domain_added(whitelist: &[String], domain: &str) -> Option<Vec<String>> {
    let domain = domain.trim();
    if whitelist.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
        return None;
    }
    let mut updated = whitelist.to_vec();
    updated.push(domain.to_string());
    Some(updated)
}

/// Whitelist without `domain`, `None` if it was not there
pub fn with_domain_removed(whitelist: &[String], domain: &str) -> Option<Vec<String>> {
    let domain = domain.trim();
    let updated: Vec<String> = whitelist
        .iter()
        .filter(|d| !d.eq_ignore_ascii_case(domain))
        .cloned()
        .collect();
    (updated.len() != whitelist.len()).then_some(updated)
}

/// Host part of a URL, or the input itself when it is a bare host
pub fn host_of(target: &str) -> Result<String> {
    let target = target.trim();
    if target.is_empty() {
        bail!("empty URL or host");
    }

    let url = if target.contains("://") {
        Url::parse(target)
    } else {
        Url::parse(&format!("http://{}", target))
    };

    match url.ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => Ok(host),
        None => bail!("cannot find a host in {}", target),
    }
}

fn describe_access(record: &ConfigRecord, host: &str) -> String {
    if record.allows_host(host) {
        if record.is_grind() {
            format!("{} is allowed (whitelisted)", host)
        } else {
            format!("{} is allowed (chill mode)", host)
        }
    } else {
        format!("{} is blocked (grind mode, not whitelisted)", host)
    }
}
