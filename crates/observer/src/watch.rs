// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming watch loop.
//!
//! Emits one JSON-serializable event per observation: a leading `snapshot`,
//! then `delta`/`idle`/`heartbeat` as the pane evolves, ending with `exited`
//! if the session disappears. Transient capture failures are tolerated; the
//! session is declared gone only after consecutive misses and consecutive
//! missing-session checks both cross their thresholds.

use crate::delta::compute_new_lines;
use crate::filter::detect_needs_input;
use crate::snapshot::{latest_line, stable_hash, summarize};
use amux_adapters::{content_hash, hash_hex, TmuxDriver};
use amux_core::Clock;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Consecutive capture failures tolerated before probing session state.
pub const CAPTURE_MISS_THRESHOLD: u32 = 3;
/// Consecutive missing-session probes before declaring the session gone.
pub const MISSING_SESSION_THRESHOLD: u32 = 3;

/// Watch loop parameters. All durations are validated positive by the
/// caller; a zero heartbeat disables heartbeat events.
#[derive(Debug, Clone)]
pub struct WatchParams {
    pub lines: u32,
    pub interval: Duration,
    pub idle_threshold: Duration,
    pub heartbeat: Duration,
}

/// One line of the watch stream.
#[derive(Debug, Clone, Serialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_lines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_input: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_seconds: Option<f64>,
    pub ts: String,
}

impl WatchEvent {
    fn bare(kind: &str, ts: String) -> Self {
        Self {
            kind: kind.to_string(),
            content: None,
            new_lines: None,
            hash: None,
            latest_line: None,
            summary: None,
            needs_input: None,
            input_hint: None,
            idle_seconds: None,
            heartbeat_seconds: None,
            ts,
        }
    }
}

fn rfc3339<C: Clock>(clock: &C) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(clock.epoch_ms() as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

enum MissVerdict {
    KeepWatching,
    Exited,
}

/// Shared capture-miss bookkeeping for the watch and wait loops.
pub(crate) async fn note_capture_miss<D: TmuxDriver>(
    driver: &D,
    session_name: &str,
    misses: &mut u32,
    missing_checks: &mut u32,
) -> bool {
    *misses += 1;
    if *misses < CAPTURE_MISS_THRESHOLD {
        return false;
    }
    match driver.session_state(session_name).await {
        // The check failing, or the session being alive, means the capture
        // path is flaky rather than the session being gone.
        Err(_) => {
            *misses = 0;
            *missing_checks = 0;
            false
        }
        Ok(state) if state.exists => {
            *misses = 0;
            *missing_checks = 0;
            false
        }
        Ok(_) => {
            *missing_checks += 1;
            *missing_checks >= MISSING_SESSION_THRESHOLD
        }
    }
}

/// Run the watch loop until the session exits, the shutdown signal fires,
/// or the event writer fails.
pub async fn watch<D: TmuxDriver, C: Clock>(
    driver: &D,
    clock: &C,
    session_name: &str,
    params: &WatchParams,
    mut shutdown: oneshot::Receiver<()>,
    emit: &mut dyn FnMut(&WatchEvent) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let mut misses = 0u32;
    let mut missing_checks = 0u32;

    // Startup: capture until success or the exit heuristic fires.
    let first = loop {
        match driver.capture_pane_tail(session_name, params.lines).await {
            Ok(text) => break text,
            Err(_) => {
                if note_capture_miss(driver, session_name, &mut misses, &mut missing_checks).await
                {
                    tracing::debug!(session = session_name, "session gone, ending watch");
                    emit(&WatchEvent::bare("exited", rfc3339(clock)))?;
                    return Ok(());
                }
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(params.interval) => {}
            _ = &mut shutdown => return Ok(()),
        }
    };

    let mut snapshot_event = WatchEvent::bare("snapshot", rfc3339(clock));
    let needs_input = detect_needs_input(&first);
    snapshot_event.content = Some(first.clone());
    snapshot_event.hash = Some(hash_hex(&stable_hash(&first)));
    snapshot_event.latest_line = Some(latest_line(&first));
    snapshot_event.summary = Some(summarize(&first));
    snapshot_event.needs_input = Some(needs_input.is_some());
    snapshot_event.input_hint = needs_input;
    emit(&snapshot_event)?;

    let mut last_hash = content_hash(first.as_bytes());
    let mut last_lines: Vec<String> = first.split('\n').map(str::to_string).collect();
    let mut last_change: Instant = clock.now();
    let mut last_heartbeat: Instant = clock.now();
    let mut emitted_idle = false;
    misses = 0;
    missing_checks = 0;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(params.interval) => {}
            _ = &mut shutdown => return Ok(()),
        }

        let text = match driver.capture_pane_tail(session_name, params.lines).await {
            Ok(text) => text,
            Err(_) => {
                if note_capture_miss(driver, session_name, &mut misses, &mut missing_checks).await
                {
                    tracing::debug!(session = session_name, "session gone, ending watch");
                    emit(&WatchEvent::bare("exited", rfc3339(clock)))?;
                    return Ok(());
                }
                continue;
            }
        };
        misses = 0;
        missing_checks = 0;

        let hash = content_hash(text.as_bytes());
        if hash == last_hash {
            let elapsed = clock.now().duration_since(last_change);
            if elapsed >= params.idle_threshold && !emitted_idle {
                let mut event = WatchEvent::bare("idle", rfc3339(clock));
                event.idle_seconds = Some(elapsed.as_secs_f64());
                emit(&event)?;
                emitted_idle = true;
            } else if params.heartbeat > Duration::ZERO {
                let since_beat = clock.now().duration_since(last_heartbeat);
                if since_beat >= params.heartbeat {
                    let mut event = WatchEvent::bare("heartbeat", rfc3339(clock));
                    event.heartbeat_seconds = Some(since_beat.as_secs_f64());
                    emit(&event)?;
                    last_heartbeat = clock.now();
                }
            }
            continue;
        }

        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let new_lines = compute_new_lines(&last_lines, &lines);
        if new_lines.is_empty() {
            // Redraw without new content; advance without emitting
            last_hash = hash;
            last_lines = lines;
            continue;
        }

        let mut event = WatchEvent::bare("delta", rfc3339(clock));
        let needs_input = detect_needs_input(&text);
        event.new_lines = Some(new_lines);
        event.hash = Some(hash_hex(&hash));
        event.latest_line = Some(latest_line(&text));
        event.summary = Some(summarize(&text));
        event.needs_input = Some(needs_input.is_some());
        event.input_hint = needs_input;
        emit(&event)?;

        last_hash = hash;
        last_lines = lines;
        last_change = clock.now();
        last_heartbeat = clock.now();
        emitted_idle = false;
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
