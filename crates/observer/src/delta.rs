// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delta computation between consecutive pane captures.

/// Compute the lines appended to `current` since `previous`.
///
/// Anchors on the rightmost occurrence of `previous`'s last line inside
/// `current` whose backward overlap verifies, then returns everything after
/// the anchor. If no anchor verifies: `current` being a prefix of
/// `previous` means content shrank (empty delta); anything else returns all
/// of `current`. Tuned for append-mostly panes; interleaved rewrites may
/// over- or under-report.
pub fn compute_new_lines(previous: &[String], current: &[String]) -> Vec<String> {
    let previous = strip_trailing_empty(previous);
    let current = strip_trailing_empty(current);

    if current.is_empty() {
        return Vec::new();
    }
    let Some(prev_last) = previous.last() else {
        return current.to_vec();
    };

    for i in (0..current.len()).rev() {
        if &current[i] != prev_last {
            continue;
        }
        let overlap = previous.len().min(i + 1);
        let verified = (0..overlap).all(|k| previous[previous.len() - 1 - k] == current[i - k]);
        if verified {
            return current[i + 1..].to_vec();
        }
    }

    if is_prefix(current, previous) {
        return Vec::new();
    }
    current.to_vec()
}

/// Convenience wrapper over raw capture text.
pub fn compute_new_text(previous: &str, current: &str) -> Vec<String> {
    let prev: Vec<String> = previous.split('\n').map(str::to_string).collect();
    let curr: Vec<String> = current.split('\n').map(str::to_string).collect();
    compute_new_lines(&prev, &curr)
}

/// Drop the single empty tail produced by splitting text that ends with a
/// newline.
fn strip_trailing_empty(lines: &[String]) -> &[String] {
    match lines.last() {
        Some(last) if last.is_empty() => &lines[..lines.len() - 1],
        _ => lines,
    }
}

fn is_prefix(candidate: &[String], of: &[String]) -> bool {
    candidate.len() <= of.len() && of[..candidate.len()] == *candidate
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
