// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wait loop: observe a pane until the assistant finishes responding.
//!
//! Produces a single terminal result. Termination conditions, in priority
//! order: overall timeout (or cancellation), session exit, an explicit
//! needs-input prompt, and idle stabilization after a substantive change.
//! A run that never changes substantively times out after the initial
//! change window.

use crate::delta::compute_new_text;
use crate::filter::{compact_agent_output, detect_needs_input};
use crate::snapshot::{latest_line, stable_hash, summarize};
use crate::watch::note_capture_miss;
use amux_adapters::{content_hash, TmuxDriver};
use amux_core::Clock;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Ceiling on waiting for the first substantive change.
pub const INITIAL_CHANGE_TIMEOUT: Duration = Duration::from_secs(90);

/// Wait loop parameters.
#[derive(Debug, Clone)]
pub struct WaitParams {
    pub capture_lines: u32,
    pub poll_interval: Duration,
    pub idle_threshold: Duration,
    pub wait_timeout: Duration,
}

/// Baseline captured just before the keystrokes were sent.
#[derive(Debug, Clone)]
pub struct WaitBaseline {
    pub content: String,
    /// Raw hash, compared for exact equality against post-send captures.
    pub hash: [u8; 16],
    /// Chrome-stripped hash answering "did anything substantive change?".
    pub stable: [u8; 16],
}

impl WaitBaseline {
    pub fn capture(content: String) -> Self {
        let hash = content_hash(content.as_bytes());
        let stable = stable_hash(&content);
        Self {
            content,
            hash,
            stable,
        }
    }
}

/// How the wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStatus {
    Idle,
    NeedsInput,
    SessionExited,
    TimedOut,
}

impl WaitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitStatus::Idle => "idle",
            WaitStatus::NeedsInput => "needs_input",
            WaitStatus::SessionExited => "session_exited",
            WaitStatus::TimedOut => "timed_out",
        }
    }
}

/// Terminal result of a wait.
#[derive(Debug, Clone, Serialize)]
pub struct WaitOutcome {
    pub status: WaitStatus,
    pub content: String,
    /// Chrome-stripped lines added since the baseline.
    pub delta: String,
    pub latest_line: String,
    pub summary: String,
    pub needs_input: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<String>,
    pub idle_seconds: f64,
    pub timed_out: bool,
    pub session_exited: bool,
    pub changed: bool,
}

struct WaitState {
    last_content: String,
    last_non_empty: String,
    last_different_from_pre: String,
    content_changed: bool,
    last_stable: [u8; 16],
    last_change: Instant,
}

/// Poll the pane until a terminal condition is met.
pub async fn wait_for_response<D: TmuxDriver, C: Clock>(
    driver: &D,
    clock: &C,
    session_name: &str,
    params: &WaitParams,
    baseline: &WaitBaseline,
    mut cancel: oneshot::Receiver<()>,
) -> WaitOutcome {
    let started = clock.now();
    let mut misses = 0u32;
    let mut missing_checks = 0u32;
    let mut state = WaitState {
        last_content: String::new(),
        last_non_empty: String::new(),
        last_different_from_pre: String::new(),
        content_changed: false,
        last_stable: baseline.stable,
        last_change: started,
    };

    loop {
        if clock.now().duration_since(started) >= params.wait_timeout {
            return finish(WaitStatus::TimedOut, &state, baseline, 0.0);
        }

        match driver
            .capture_pane_tail(session_name, params.capture_lines)
            .await
        {
            Err(_) => {
                if note_capture_miss(driver, session_name, &mut misses, &mut missing_checks).await
                {
                    tracing::debug!(session = session_name, "session gone during wait");
                    return finish(WaitStatus::SessionExited, &state, baseline, 0.0);
                }
            }
            Ok(text) => {
                misses = 0;
                missing_checks = 0;

                state.last_content = text.clone();
                if !text.is_empty() {
                    state.last_non_empty = text.clone();
                    if text != baseline.content {
                        state.last_different_from_pre = text.clone();
                    }
                }

                // An explicit prompt short-circuits idle stabilization so
                // orchestrators can surface the question immediately.
                if content_hash(text.as_bytes()) != baseline.hash {
                    if let Some(hint) = detect_needs_input(&text) {
                        let mut outcome = finish(WaitStatus::NeedsInput, &state, baseline, 0.0);
                        outcome.needs_input = true;
                        outcome.input_hint = Some(hint.clone());
                        outcome.summary = format!("Needs input: {}", hint);
                        return outcome;
                    }
                }

                let stable = stable_hash(&text);
                if stable != state.last_stable {
                    state.last_stable = stable;
                    state.last_change = clock.now();
                    if stable != baseline.stable {
                        state.content_changed = true;
                    }
                }

                if state.content_changed {
                    let quiet = clock.now().duration_since(state.last_change);
                    if quiet >= params.idle_threshold {
                        return finish(WaitStatus::Idle, &state, baseline, quiet.as_secs_f64());
                    }
                } else if clock.now().duration_since(started) >= INITIAL_CHANGE_TIMEOUT {
                    return finish(WaitStatus::TimedOut, &state, baseline, 0.0);
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(params.poll_interval) => {}
            _ = &mut cancel => {
                return finish(WaitStatus::TimedOut, &state, baseline, 0.0);
            }
        }
    }
}

/// Pick the content to report: the current capture when a substantive
/// change was seen, else the best fallback observed along the way.
fn preferred_wait_content<'a>(state: &'a WaitState, baseline: &'a WaitBaseline) -> &'a str {
    if state.content_changed
        && !state.last_content.is_empty()
        && state.last_content != baseline.content
    {
        return &state.last_content;
    }
    if !state.last_different_from_pre.is_empty() {
        return &state.last_different_from_pre;
    }
    if !state.last_non_empty.is_empty() {
        return &state.last_non_empty;
    }
    &baseline.content
}

fn finish(
    status: WaitStatus,
    state: &WaitState,
    baseline: &WaitBaseline,
    idle_seconds: f64,
) -> WaitOutcome {
    let content = preferred_wait_content(state, baseline).to_string();
    let delta_lines = compute_new_text(&baseline.content, &content);
    let delta = compact_agent_output(&delta_lines.join("\n"));
    let latest = latest_line(&content);
    let summary = match status {
        WaitStatus::SessionExited => "Session exited".to_string(),
        WaitStatus::TimedOut => "Timed out waiting for response".to_string(),
        _ => summarize(&content),
    };
    WaitOutcome {
        status,
        content,
        delta,
        latest_line: latest,
        summary,
        needs_input: false,
        input_hint: None,
        idle_seconds,
        timed_out: status == WaitStatus::TimedOut,
        session_exited: status == WaitStatus::SessionExited,
        changed: state.content_changed,
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
