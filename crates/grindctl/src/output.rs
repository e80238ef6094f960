//! Terminal rendering of the configuration record

use chrono::{DateTime, Local, Utc};
use grind_common::{ConfigRecord, Mode};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Status card: mode, expiry, client flag, whitelist
pub fn render_record(record: &ConfigRecord, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let mode = record.mode.as_str().to_uppercase();
    let mode = match record.mode {
        Mode::Chill => mode.green().bold().to_string(),
        Mode::Grind => mode.red().bold().to_string(),
    };
    writeln!(out, "Mode: {}", mode).ok();

    if record.is_grind() {
        let until = match (record.until.as_deref(), record.until_instant()) {
            (None, _) => "indefinite (no time limit)".to_string(),
            (Some(_), Some(until)) => format!(
                "{} ({} left)",
                until.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                format_remaining(until - now)
            ),
            (Some(raw), None) => format!("{} (unparseable)", raw),
        };
        writeln!(out, "Until: {}", until).ok();
    }

    if record.client_initiated {
        writeln!(
            out,
            "{}",
            "Client-initiated grind: only an admin or the timer can end it".yellow()
        )
        .ok();
    }

    if record.whitelist.is_empty() {
        writeln!(out, "Whitelist: (empty)").ok();
    } else {
        writeln!(out, "Whitelist:").ok();
        for domain in &record.whitelist {
            writeln!(out, "  - {}", domain).ok();
        }
    }

    out
}

/// Compact "2h 5m" style duration, clamped at zero
pub fn format_remaining(remaining: chrono::Duration) -> String {
    let minutes = remaining.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
