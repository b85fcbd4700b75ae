use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use serde::Serialize;

use fitflow_core::models::Height;

/// Parse a height given as `5'10"`, `5'10`, `5ft 10in`, `5 10` or plain
/// inches (`70`) into total inches.
pub(crate) fn parse_height(s: &str) -> Result<i64> {
    let s = s.trim();
    let invalid = || format!("Invalid height '{s}'. Use feet and inches like 5'10\" or inches like 70");

    if let Ok(inches) = s.parse::<i64>() {
        return Ok(inches);
    }

    let normalized = s
        .to_lowercase()
        .replace("feet", "'")
        .replace("ft", "'")
        .replace("inches", "")
        .replace("in", "")
        .replace('"', "");
    let (feet, inches) = match normalized.split_once('\'') {
        Some((feet, inches)) => (feet.trim(), inches.trim()),
        None => normalized
            .trim()
            .split_once(char::is_whitespace)
            .map(|(f, i)| (f.trim(), i.trim()))
            .with_context(invalid)?,
    };

    let feet: i64 = feet.parse().with_context(invalid)?;
    let inches: i64 = if inches.is_empty() {
        0
    } else {
        inches.parse().with_context(invalid)?
    };
    if feet < 0 || !(0..12).contains(&inches) {
        bail!(invalid());
    }
    Ok(Height::from_feet_inches(feet, inches).total_inches())
}

/// Render a stored RFC 3339 timestamp as local `YYYY-MM-DD HH:MM`.
pub(crate) fn format_timestamp(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts).map_or_else(
        |_| ts.to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Shorten `s` to `max` characters on one line, ending in `...` when cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max {
        s
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
