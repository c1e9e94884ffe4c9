// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tab, agent, and request identifier generation

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Per-process counter disambiguating tab ids generated within the same
/// nanosecond tick.
static TAB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a tab identifier.
///
/// Format: `t_<base36 time-ns>_<base36 counter>_<hex random>`. The time and
/// counter components make ids strictly unique within a process; the 4
/// random bytes make collisions across processes overwhelmingly unlikely.
pub fn generate_tab_id<C: Clock>(clock: &C) -> String {
    let nanos = u128::from(clock.epoch_ms()) * 1_000_000;
    let count = TAB_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!(
        "t_{}_{}_{}",
        base36(nanos),
        base36(u128::from(count)),
        random_hex(4)
    )
}

/// Generate a request id for response envelopes.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).to_string()
}

fn random_hex(bytes: usize) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..bytes)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}

/// Errors from agent-id parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentIdError {
    #[error("invalid agent id: {0} (expected <workspace-id>:<tab-id>)")]
    Invalid(String),
}

/// Agent identifier: `<workspace-id>:<tab-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    pub workspace_id: String,
    pub tab_id: String,
}

impl AgentId {
    pub fn new(workspace_id: impl Into<String>, tab_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            tab_id: tab_id.into(),
        }
    }

    /// Parse `<workspace-id>:<tab-id>`. Both halves must be non-empty; the
    /// tab half may itself contain no further colons.
    pub fn parse(s: &str) -> Result<Self, AgentIdError> {
        let (ws, tab) = s
            .split_once(':')
            .ok_or_else(|| AgentIdError::Invalid(s.to_string()))?;
        if ws.is_empty() || tab.is_empty() || tab.contains(':') {
            return Err(AgentIdError::Invalid(s.to_string()));
        }
        Ok(Self::new(ws, tab))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workspace_id, self.tab_id)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
