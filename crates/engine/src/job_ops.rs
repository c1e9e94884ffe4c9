// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent job` verbs: status, cancel, wait.

use crate::context::{Engine, EngineError};
use amux_core::{Clock, ErrorCode, SendJob};
use amux_storage::StoreError;
use serde_json::json;
use std::time::Duration;

/// Poll cadence for `agent job wait`.
const JOB_WAIT_POLL: Duration = Duration::from_millis(50);

impl<D, C: Clock> Engine<D, C> {
    /// Current record of a send job.
    pub fn job_status(&self, job_id: &str) -> Result<serde_json::Value, EngineError> {
        let job = self.load_job(job_id)?;
        Ok(job_payload(&job))
    }

    /// Cancel a queued job. No-op for running and terminal jobs.
    pub fn job_cancel(&self, job_id: &str) -> Result<serde_json::Value, EngineError> {
        let (job, canceled) = self
            .jobs()
            .cancel(job_id, self.clock.epoch_secs())
            .map_err(|e| self.job_error(e))?;
        let mut payload = job_payload(&job);
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("canceled".to_string(), json!(canceled));
        }
        Ok(payload)
    }

    /// Block until a job reaches a terminal status.
    pub async fn job_wait(
        &self,
        job_id: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, EngineError> {
        let started = self.clock.now();
        loop {
            let job = self.load_job(job_id)?;
            if job.status.is_terminal() {
                return Ok(job_payload(&job));
            }
            if self.clock.now().duration_since(started) >= timeout {
                return Err(EngineError::new(
                    ErrorCode::JobStatusFailed,
                    format!("timed out waiting for job {}", job_id),
                ));
            }
            tokio::time::sleep(JOB_WAIT_POLL).await;
        }
    }

    fn load_job(&self, job_id: &str) -> Result<SendJob, EngineError> {
        self.jobs()
            .get(job_id, self.clock.epoch_secs())
            .map_err(|e| self.job_error(e))
    }

    fn job_error(&self, e: StoreError) -> EngineError {
        match e {
            StoreError::NotFound(what) => {
                EngineError::new(ErrorCode::JobNotFound, format!("{} not found", what))
            }
            other => EngineError::new(ErrorCode::JobStatusFailed, other.to_string()),
        }
    }
}

fn job_payload(job: &SendJob) -> serde_json::Value {
    json!({
        "job_id": job.id,
        "session_name": job.session_name,
        "agent_id": job.agent_id,
        "status": job.status.to_string(),
        "error": job.error,
        "sequence": job.sequence,
        "created_at": job.created_at,
        "updated_at": job.updated_at,
        "completed_at": job.completed_at,
    })
}

#[cfg(test)]
#[path = "job_ops_tests.rs"]
mod tests;
