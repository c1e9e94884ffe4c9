// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine context: capability set, tuning knobs, idempotency wrapper.

use amux_core::{AssistantTable, Clock, ErrorCode};
use amux_storage::{IdempotencyStore, SendJobStore, StoreError, WorkspaceStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix for every session name the control plane owns.
pub const SESSION_PREFIX: &str = "amux";

/// Reserved session tag keys.
pub mod tags {
    pub const AMUX: &str = "@amux";
    pub const WORKSPACE: &str = "@amux_workspace";
    pub const TAB: &str = "@amux_tab";
    pub const TYPE: &str = "@amux_type";
    pub const ASSISTANT: &str = "@amux_assistant";
    pub const CREATED_AT: &str = "@amux_created_at";
}

/// An operation failure carrying its stable error code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn env_duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Timing knobs, each overridable via an `AMUX_*_MS` env var.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Pane readiness poll interval.
    pub ready_poll: Duration,
    /// Pane readiness ceiling (advisory; the prompt is sent regardless).
    pub ready_wait: Duration,
    /// Post-send delivery confirmation window for codex.
    pub delivery_wait: Duration,
    /// Queue-turn poll interval.
    pub queue_poll: Duration,
    /// Queue-turn ceiling before job_queue_failed.
    pub queue_max_wait: Duration,
    /// Lines captured for wait baselines and responses.
    pub capture_lines: u32,
    /// Wait loop poll interval.
    pub wait_poll: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ready_poll: env_duration_ms("AMUX_READY_POLL_MS", Duration::from_millis(200)),
            ready_wait: env_duration_ms("AMUX_READY_WAIT_MS", Duration::from_secs(15)),
            delivery_wait: env_duration_ms("AMUX_DELIVERY_WAIT_MS", Duration::from_secs(2)),
            queue_poll: env_duration_ms("AMUX_QUEUE_POLL_MS", Duration::from_millis(50)),
            queue_max_wait: env_duration_ms("AMUX_QUEUE_MAX_WAIT_MS", Duration::from_secs(60)),
            capture_lines: 200,
            wait_poll: env_duration_ms("AMUX_WAIT_POLL_MS", Duration::from_millis(250)),
        }
    }
}

/// The lifecycle controller's capability set. Constructed once per CLI
/// invocation; tests inject fakes here instead of patching globals.
pub struct Engine<D, C> {
    pub driver: D,
    pub clock: C,
    home: PathBuf,
    version: String,
    pub tuning: Tuning,
}

impl<D, C: Clock> Engine<D, C> {
    pub fn new(driver: D, clock: C, home: PathBuf, version: impl Into<String>) -> Self {
        Self {
            driver,
            clock,
            home,
            version: version.into(),
            tuning: Tuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn workspaces(&self) -> WorkspaceStore {
        WorkspaceStore::new(&self.home)
    }

    pub fn jobs(&self) -> SendJobStore {
        SendJobStore::new(&self.home)
    }

    pub fn idempotency(&self) -> IdempotencyStore {
        IdempotencyStore::new(&self.home)
    }

    /// Assistant commands: built-ins overlaid with `<home>/assistants.toml`.
    pub fn assistants(&self) -> AssistantTable {
        match std::fs::read_to_string(self.home.join("assistants.toml")) {
            Ok(content) => AssistantTable::from_toml(&content),
            Err(_) => AssistantTable::builtin(),
        }
    }

    /// Look up a stored response for `(command, key)`.
    pub fn replay(&self, command: &str, key: &str) -> Result<Option<(String, i32)>, EngineError> {
        self.idempotency()
            .replay(command, key, self.clock.epoch_secs())
            .map_err(idempotency_error)
    }

    /// Persist a response for future replay. Callers must surface a failure
    /// here instead of emitting the original response (fail closed).
    pub fn persist_response(
        &self,
        command: &str,
        key: &str,
        exit_code: i32,
        envelope: &str,
    ) -> Result<(), EngineError> {
        self.idempotency()
            .store(command, key, exit_code, envelope, self.clock.epoch_secs())
            .map_err(idempotency_error)
    }
}

fn idempotency_error(e: StoreError) -> EngineError {
    EngineError::new(
        ErrorCode::IdempotencyFailed,
        format!("idempotency store: {}", e),
    )
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
