// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-text filters: chrome, progress noise, needs-input detection.
//!
//! The filters are heuristics tuned per assistant vendor, kept as rule
//! tables so new assistants extend the data instead of the loop.

/// Box-drawing characters framing assistant TUI panels.
const BOX_DRAWING: &[char] = &[
    '╭', '╮', '╰', '╯', '│', '┃', '─', '━', '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼',
];

/// Spinner glyphs prefixing elapsed-time lines.
const SPINNERS: &[char] = &[
    '✻', '✶', '✽', '✢', '✳', '⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏',
];

/// Block glyphs from the Claude startup banner.
const BANNER_GLYPHS: &[char] = &['▟', '▛', '▜', '▙', '▐', '▌', '▝', '▘', '▗', '▖', '█'];

/// Tool-activity lines echoed by assistants; no semantic signal.
const ACTIVITY_PREFIXES: &[&str] = &["Ran ", "Interacted with "];

/// Vendor telemetry and housekeeping strings.
const TELEMETRY_MARKERS: &[&str] = &[
    "Auto-update failed",
    "Update installed",
    "Press Ctrl-C again to exit",
    "✗ Auto-update",
];

/// Prompt markers: a line starting with one of these is the input line, and
/// indented lines under it are echo continuations.
const PROMPT_MARKERS: &[char] = &['›', '❯'];

/// Explicit needs-input markers (matched case-insensitively).
const NEEDS_INPUT_MARKERS: &[&str] = &[
    "(y/n)",
    "[y/n]",
    "(yes/no)",
    "[yes/no]",
    "press enter",
    "press return",
    "press any key",
    "do you want",
    "would you like",
    "should i ",
    "which option",
    "select an option",
    "choose an option",
    "awaiting your input",
    "waiting for your input",
    "needs your approval",
    "requires approval",
    "permission required",
    "bypass permissions on",
];

/// Normalized hint for the permission-mode dialog, which renders as a menu
/// rather than a quotable question.
pub const PERMISSION_MODE_HINT: &str =
    "Assistant is waiting for local permission-mode selection.";

/// Question starters for the softer fallback detector.
const QUESTION_STARTERS: &[&str] = &[
    "do you",
    "would you",
    "should i",
    "can i",
    "could you",
    "which ",
    "want me to",
];

fn starts_with_any_char(line: &str, set: &[char]) -> bool {
    line.chars().next().map(|c| set.contains(&c)).unwrap_or(false)
}

/// True for decorative TUI lines that carry no content.
pub fn is_chrome_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    if starts_with_any_char(trimmed, BOX_DRAWING)
        || starts_with_any_char(trimmed, SPINNERS)
        || starts_with_any_char(trimmed, BANNER_GLYPHS)
        || starts_with_any_char(trimmed, PROMPT_MARKERS)
    {
        return true;
    }
    if ACTIVITY_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return true;
    }
    TELEMETRY_MARKERS.iter().any(|m| trimmed.contains(m))
}

/// Discard chrome from captured pane text, keeping substantive content:
/// prose, bullets, code fences, numbered lists.
///
/// Indented lines directly under a prompt-marker line are treated as echo
/// continuations of the typed input and discarded with it.
pub fn compact_agent_output(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_prompt_echo = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if starts_with_any_char(trimmed, PROMPT_MARKERS) {
            in_prompt_echo = true;
            continue;
        }
        if in_prompt_echo {
            if !line.is_empty() && line.starts_with(char::is_whitespace) {
                continue;
            }
            in_prompt_echo = false;
        }
        if is_chrome_line(line) {
            continue;
        }
        kept.push(line);
    }
    // Trim blank edges; interior blanks separate paragraphs and stay.
    while kept.first().map(|l| l.trim().is_empty()).unwrap_or(false) {
        kept.remove(0);
    }
    while kept.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        kept.pop();
    }
    kept.join("\n")
}

/// True for volatile progress lines: `Thinking <spinner>`, `Working (<t> •
/// esc to interrupt)`, or anything carrying the interrupt hint. Lines that
/// are themselves explicit needs-input markers are never noise.
pub fn is_progress_noise(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    if is_needs_input_line(&lower) {
        return false;
    }
    if lower.contains("esc to interrupt") {
        return true;
    }
    if let Some(rest) = lower.strip_prefix("thinking") {
        return rest
            .chars()
            .all(|c| c.is_whitespace() || c == '.' || c == '…' || SPINNERS.contains(&c));
    }
    false
}

fn is_needs_input_line(lower_line: &str) -> bool {
    NEEDS_INPUT_MARKERS.iter().any(|m| lower_line.contains(m))
}

/// Scan content for an explicit needs-input marker. Returns the input hint:
/// the matching line verbatim, or the fixed permission-mode string for the
/// bypass-permissions dialog.
pub fn detect_needs_input(content: &str) -> Option<String> {
    for line in content.lines().rev() {
        let lower = line.to_lowercase();
        if !is_needs_input_line(&lower) {
            continue;
        }
        if lower.contains("bypass permissions on") {
            return Some(PERMISSION_MODE_HINT.to_string());
        }
        return Some(line.trim().to_string());
    }
    None
}

/// Softer fallback used only by idle-time scans: a question line ending in
/// `?` whose text begins with a known question starter.
pub fn detect_question(content: &str) -> Option<String> {
    for line in content.lines().rev() {
        let trimmed = line.trim();
        if !trimmed.ends_with('?') {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if QUESTION_STARTERS.iter().any(|s| lower.contains(s)) {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
