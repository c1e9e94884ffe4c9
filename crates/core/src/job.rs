// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Send-job record and status machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a send job through its lifecycle.
///
/// Transitions: `pending → running → {completed, failed, canceled}` or
/// `pending → canceled`. `completed` and `canceled` absorb all further
/// transition attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl SendJobStatus {
    /// Terminal statuses never return to the queue.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SendJobStatus::Completed | SendJobStatus::Failed | SendJobStatus::Canceled
        )
    }

    /// Absorbing statuses ignore any later `set_status`.
    pub fn is_absorbing(&self) -> bool {
        matches!(self, SendJobStatus::Completed | SendJobStatus::Canceled)
    }
}

impl fmt::Display for SendJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendJobStatus::Pending => write!(f, "pending"),
            SendJobStatus::Running => write!(f, "running"),
            SendJobStatus::Completed => write!(f, "completed"),
            SendJobStatus::Failed => write!(f, "failed"),
            SendJobStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A single keystroke-delivery request bound to one tmux session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendJob {
    pub id: String,
    pub session_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub status: SendJobStatus,
    /// Failure reason; empty unless status is `failed`.
    #[serde(default)]
    pub error: String,
    /// Strictly increasing across the store's lifetime; tie-breaker for
    /// jobs created in the same second.
    pub sequence: i64,
    /// Unix seconds.
    pub created_at: u64,
    pub updated_at: u64,
    /// Set exactly when the job reaches a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl SendJob {
    pub fn new(
        id: impl Into<String>,
        session_name: impl Into<String>,
        agent_id: Option<String>,
        sequence: i64,
        now: u64,
    ) -> Self {
        Self {
            id: id.into(),
            session_name: session_name.into(),
            agent_id,
            status: SendJobStatus::Pending,
            error: String::new(),
            sequence,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Apply a status transition in place, honoring absorbing statuses.
    ///
    /// Returns `false` (leaving the record untouched) when the current
    /// status absorbs the transition.
    pub fn transition(&mut self, status: SendJobStatus, error: &str, now: u64) -> bool {
        if self.status.is_absorbing() {
            return false;
        }
        self.status = status;
        self.error = if status == SendJobStatus::Failed {
            error.to_string()
        } else {
            String::new()
        };
        self.updated_at = now;
        if status.is_terminal() {
            self.completed_at = Some(now);
        }
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
