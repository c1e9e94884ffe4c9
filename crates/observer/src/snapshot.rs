// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot hashing and one-line summaries.

use crate::filter::{detect_needs_input, is_chrome_line, is_progress_noise};
use amux_adapters::content_hash;

const SUMMARY_MAX_CHARS: usize = 100;

/// Hash of pane content with blank lines and volatile progress lines
/// elided. Two captures with the same stable hash differ only in chrome
/// churn, not in substance.
pub fn stable_hash(content: &str) -> [u8; 16] {
    let filtered: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty() && !is_progress_noise(line))
        .collect();
    content_hash(filtered.join("\n").as_bytes())
}

/// Last substantive line of a capture: non-empty, non-chrome, non-noise.
pub fn latest_line(content: &str) -> String {
    content
        .lines()
        .rev()
        .find(|line| {
            !line.trim().is_empty() && !is_chrome_line(line) && !is_progress_noise(line)
        })
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

/// Short one-liner describing a capture, used in notifications.
pub fn summarize(content: &str) -> String {
    if let Some(hint) = detect_needs_input(content) {
        return format!("Needs input: {}", hint);
    }
    let line = latest_line(content);
    if line.is_empty() {
        return "No output".to_string();
    }
    truncate_chars(&line, SUMMARY_MAX_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
