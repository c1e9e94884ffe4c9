// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared flag and identifier validation.

use std::time::Duration;

/// Check a workspace identifier: filesystem-safe token, non-empty,
/// `[a-zA-Z0-9._-]` only, no leading dot or dash.
pub fn valid_workspace_id(id: &str) -> bool {
    if id.is_empty() || id.starts_with('.') || id.starts_with('-') {
        return false;
    }
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Check an assistant name: lowercase token, `[a-z0-9_-]`, starting with a
/// letter. Callers lowercase user input before validating.
pub fn valid_assistant_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-'))
}

/// Check that a duration flag is strictly positive.
pub fn positive(d: Duration) -> bool {
    d > Duration::ZERO
}

/// Parse a human duration literal: `250ms`, `5s`, `10m`, `1h`, or a bare
/// number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration: {}", s))?;
    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n * 60)),
        "h" => Ok(Duration::from_secs(n * 3600)),
        _ => Err(format!("invalid duration unit: {}", unit)),
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
