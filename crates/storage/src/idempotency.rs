// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed replay cache for mutating CLI calls.
//!
//! Maps `(command, key)` to the exact envelope bytes and exit code of the
//! original invocation. A malformed or version-mismatched state file is
//! treated as empty so a corrupt cache can never block mutations; persist
//! failures are surfaced to the caller, which fails closed.

use crate::lock::{save_atomic, FileLock};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

/// Entries older than this are invisible and pruned on write.
pub const RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdempotencyEntry {
    exit_code: i32,
    /// Envelope bytes exactly as emitted, trailing newline included.
    envelope: String,
    /// Unix seconds.
    created_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdempotencyState {
    version: u32,
    entries: HashMap<String, IdempotencyEntry>,
}

impl Default for IdempotencyState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// File-backed replay cache under the config home.
pub struct IdempotencyStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl IdempotencyStore {
    pub fn new(home: &Path) -> Self {
        let path = home.join("cli-idempotency.json");
        let lock_path = home.join("cli-idempotency.json.lock");
        Self { path, lock_path }
    }

    fn entry_key(command: &str, key: &str) -> String {
        format!("{}|{}", command, key)
    }

    fn load(&self) -> IdempotencyState {
        let Ok(bytes) = std::fs::read(&self.path) else {
            return IdempotencyState::default();
        };
        match serde_json::from_slice::<IdempotencyState>(&bytes) {
            Ok(state) if state.version == STATE_VERSION => state,
            Ok(state) => {
                tracing::warn!(
                    version = state.version,
                    "idempotency state version mismatch, starting empty"
                );
                IdempotencyState::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed idempotency state, starting empty");
                IdempotencyState::default()
            }
        }
    }

    /// Look up a stored response. Returns `(envelope_bytes, exit_code)` when
    /// a live entry exists.
    pub fn replay(
        &self,
        command: &str,
        key: &str,
        now: u64,
    ) -> Result<Option<(String, i32)>, StoreError> {
        let _lock = FileLock::shared(&self.lock_path)?;
        let state = self.load();
        let entry_key = Self::entry_key(command, key);
        Ok(state.entries.get(&entry_key).and_then(|entry| {
            if now.saturating_sub(entry.created_at) >= RETENTION_SECS {
                return None;
            }
            Some((entry.envelope.clone(), entry.exit_code))
        }))
    }

    /// Persist a response for replay. Expired entries are pruned on the way
    /// through.
    pub fn store(
        &self,
        command: &str,
        key: &str,
        exit_code: i32,
        envelope: &str,
        now: u64,
    ) -> Result<(), StoreError> {
        let _lock = FileLock::exclusive(&self.lock_path)?;
        let mut state = self.load();
        state
            .entries
            .retain(|_, entry| now.saturating_sub(entry.created_at) < RETENTION_SECS);
        state.entries.insert(
            Self::entry_key(command, key),
            IdempotencyEntry {
                exit_code,
                envelope: envelope.to_string(),
                created_at: now,
            },
        );
        let bytes = serde_json::to_vec_pretty(&state)?;
        save_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
