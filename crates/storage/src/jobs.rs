// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-session send-job queue.
//!
//! A single JSON file holds every job plus the monotonic sequence counter.
//! All mutation paths take the store's exclusive lock, load, mutate, and
//! atomically replace the file. The per-session FIFO is enforced by
//! `try_take_turn`: only the head job may acquire the session's queue lock,
//! and that lock is taken while the store lock is still held so two
//! cooperating processes cannot invert delivery order.

use crate::lock::{save_atomic, FileLock};
use crate::StoreError;
use amux_core::{SendJob, SendJobStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SendJobState {
    version: u32,
    next_sequence: i64,
    jobs: HashMap<String, SendJob>,
}

impl Default for SendJobState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            next_sequence: 0,
            jobs: HashMap::new(),
        }
    }
}

/// Tunables for the job store.
#[derive(Debug, Clone)]
pub struct JobStoreConfig {
    /// Pending/running jobs untouched for this long are rewritten to failed
    /// on the next read. Covers orphaned async sender processes.
    pub stale_after_secs: u64,
}

impl Default for JobStoreConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 600,
        }
    }
}

/// Outcome of a queue-turn attempt.
pub enum TurnStatus {
    /// This job is the head; the per-session queue lock is held.
    Acquired(QueueTurn),
    /// The job reached a terminal status while queued; the caller should
    /// short-circuit without sending.
    Terminal(SendJob),
    /// Another job is ahead (or holds the session lock); retry after a poll
    /// interval.
    Waiting,
}

/// Holds the per-session queue lock for the duration of a keystroke send.
pub struct QueueTurn {
    _lock: FileLock,
}

impl QueueTurn {
    /// Release the session queue lock.
    pub fn release(self) {}
}

/// File-backed send-job store under the config home.
pub struct SendJobStore {
    home: PathBuf,
    path: PathBuf,
    lock_path: PathBuf,
    config: JobStoreConfig,
}

impl SendJobStore {
    pub fn new(home: &Path) -> Self {
        Self::with_config(home, JobStoreConfig::default())
    }

    pub fn with_config(home: &Path, config: JobStoreConfig) -> Self {
        Self {
            home: home.to_path_buf(),
            path: home.join("send-jobs.json"),
            lock_path: home.join("send-jobs.json.lock"),
            config,
        }
    }

    fn queue_lock_path(&self, session_name: &str) -> PathBuf {
        let safe: String = session_name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '-',
            })
            .collect();
        self.home.join(format!("queue-{}.lock", safe))
    }

    fn load(&self) -> SendJobState {
        let Ok(bytes) = std::fs::read(&self.path) else {
            return SendJobState::default();
        };
        match serde_json::from_slice::<SendJobState>(&bytes) {
            Ok(state) if state.version == STATE_VERSION => state,
            Ok(state) => {
                tracing::warn!(
                    version = state.version,
                    "send-job state version mismatch, starting empty"
                );
                SendJobState::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed send-job state, starting empty");
                SendJobState::default()
            }
        }
    }

    fn persist(&self, state: &SendJobState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        save_atomic(&self.path, &bytes)?;
        Ok(())
    }

    /// Rewrite jobs stuck in pending/running past the staleness window.
    /// Returns true when anything changed.
    fn reconcile(&self, state: &mut SendJobState, now: u64) -> bool {
        let mut changed = false;
        for job in state.jobs.values_mut() {
            let stale = !job.status.is_terminal()
                && now.saturating_sub(job.updated_at) >= self.config.stale_after_secs;
            if stale {
                let error = format!("stale {} timeout", job.status);
                tracing::warn!(job_id = %job.id, error = %error, "reconciling stale job");
                job.transition(SendJobStatus::Failed, &error, now);
                changed = true;
            }
        }
        changed
    }

    /// Load under the exclusive lock, reconciling stale jobs in place.
    fn locked_state(&self, now: u64) -> Result<(FileLock, SendJobState), StoreError> {
        let lock = FileLock::exclusive(&self.lock_path)?;
        let mut state = self.load();
        if self.reconcile(&mut state, now) {
            self.persist(&state)?;
        }
        Ok((lock, state))
    }

    /// Create a new pending job.
    pub fn create(
        &self,
        session_name: &str,
        agent_id: Option<String>,
        now: u64,
    ) -> Result<SendJob, StoreError> {
        let (_lock, mut state) = self.locked_state(now)?;
        state.next_sequence += 1;
        let id = format!("sj_{}", uuid::Uuid::new_v4().simple());
        let job = SendJob::new(&id, session_name, agent_id, state.next_sequence, now);
        state.jobs.insert(id, job.clone());
        self.persist(&state)?;
        Ok(job)
    }

    /// Fetch a job by id.
    pub fn get(&self, id: &str, now: u64) -> Result<SendJob, StoreError> {
        let (_lock, state) = self.locked_state(now)?;
        state
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))
    }

    /// Apply a status transition. Absorbing statuses are preserved: the
    /// returned record carries whatever status the job actually has.
    pub fn set_status(
        &self,
        id: &str,
        status: SendJobStatus,
        error: &str,
        now: u64,
    ) -> Result<SendJob, StoreError> {
        let (_lock, mut state) = self.locked_state(now)?;
        let job = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;
        if job.transition(status, error, now) {
            let updated = job.clone();
            self.persist(&state)?;
            return Ok(updated);
        }
        Ok(job.clone())
    }

    /// Cancel a queued job. Returns `(record, true)` when a pending job was
    /// canceled; running and terminal jobs are left untouched.
    pub fn cancel(&self, id: &str, now: u64) -> Result<(SendJob, bool), StoreError> {
        let (_lock, mut state) = self.locked_state(now)?;
        let job = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;
        if job.status != SendJobStatus::Pending {
            return Ok((job.clone(), false));
        }
        job.transition(SendJobStatus::Canceled, "", now);
        let updated = job.clone();
        self.persist(&state)?;
        Ok((updated, true))
    }

    /// The job currently entitled to deliver for a session: the running job
    /// if one exists, else the earliest pending job by `(created_at,
    /// sequence)`.
    pub fn head_of_queue(
        &self,
        session_name: &str,
        now: u64,
    ) -> Result<Option<SendJob>, StoreError> {
        let (_lock, state) = self.locked_state(now)?;
        Ok(head(&state, session_name).cloned())
    }

    /// Attempt to take the delivery turn for `id`.
    ///
    /// The per-session queue lock is acquired while the store lock is still
    /// held; releasing the store lock first would let a later job slip in
    /// between head computation and lock acquisition.
    pub fn try_take_turn(&self, id: &str, now: u64) -> Result<TurnStatus, StoreError> {
        let (_store_lock, state) = self.locked_state(now)?;
        let job = state
            .jobs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;

        if job.status.is_terminal() {
            return Ok(TurnStatus::Terminal(job.clone()));
        }

        let is_head = head(&state, &job.session_name).map(|h| h.id == job.id) == Some(true);
        if !is_head {
            return Ok(TurnStatus::Waiting);
        }

        match FileLock::try_exclusive(&self.queue_lock_path(&job.session_name))? {
            Some(lock) => Ok(TurnStatus::Acquired(QueueTurn { _lock: lock })),
            None => Ok(TurnStatus::Waiting),
        }
    }
}

fn head<'a>(state: &'a SendJobState, session_name: &str) -> Option<&'a SendJob> {
    if let Some(running) = state
        .jobs
        .values()
        .find(|j| j.session_name == session_name && j.status == SendJobStatus::Running)
    {
        return Some(running);
    }
    state
        .jobs
        .values()
        .filter(|j| j.session_name == session_name && j.status == SendJobStatus::Pending)
        .min_by_key(|j| (j.created_at, j.sequence))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
