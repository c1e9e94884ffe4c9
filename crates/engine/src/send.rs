// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent send`: queue and deliver keystrokes to a session.

use crate::context::{tags, Engine, EngineError};
use amux_adapters::TmuxDriver;
use amux_core::{validate, AgentId, Clock, ErrorCode, SendJob, SendJobStatus};
use amux_observer::{wait_for_response, WaitBaseline, WaitParams};
use amux_storage::{StoreError, TurnStatus};
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;

/// Arguments for `agent send`.
#[derive(Debug, Clone)]
pub struct SendArgs {
    pub session_name: Option<String>,
    pub agent: Option<String>,
    pub text: String,
    pub enter: bool,
    pub asynchronous: bool,
    pub wait: bool,
    pub wait_timeout: Duration,
    pub idle_threshold: Duration,
    /// Internal: this process is the detached companion for an existing job.
    pub process_job: bool,
    pub job_id: Option<String>,
}

impl<D: TmuxDriver, C: Clock> Engine<D, C> {
    /// Deliver text to a session through the per-session FIFO.
    pub async fn send(
        &self,
        args: SendArgs,
        cancel: oneshot::Receiver<()>,
    ) -> Result<serde_json::Value, EngineError> {
        if args.text.is_empty() {
            return Err(EngineError::new(ErrorCode::UsageError, "--text is required"));
        }
        if args.wait {
            if !validate::positive(args.wait_timeout) {
                return Err(EngineError::new(
                    ErrorCode::UsageError,
                    "--wait-timeout must be positive",
                ));
            }
            if !validate::positive(args.idle_threshold) {
                return Err(EngineError::new(
                    ErrorCode::UsageError,
                    "--idle-threshold must be positive",
                ));
            }
        }

        let jobs = self.jobs();
        let now = self.clock.epoch_secs();

        // An adopted job is the source of truth for its session name; this
        // defends against a positional mismatch from the spawning process.
        let (session, agent_id, existing_job) = if let Some(ref job_id) = args.job_id {
            let job = jobs.get(job_id, now).map_err(|e| match e {
                StoreError::NotFound(_) => {
                    EngineError::new(ErrorCode::NotFound, format!("job not found: {}", job_id))
                }
                other => EngineError::new(ErrorCode::JobStatusFailed, other.to_string()),
            })?;
            (job.session_name.clone(), job.agent_id.clone(), Some(job))
        } else {
            let (session, agent_id) = self.resolve_send_target(&args).await?;
            (session, agent_id, None)
        };

        // Validate session existence before touching the queue.
        match self.driver.session_state(&session).await {
            Err(e) => {
                return Err(EngineError::new(
                    ErrorCode::SessionLookupFailed,
                    e.to_string(),
                ));
            }
            Ok(state) if !state.exists => {
                if let Some(ref job) = existing_job {
                    let _ = jobs.set_status(
                        &job.id,
                        SendJobStatus::Failed,
                        "session not found",
                        now,
                    );
                }
                return Err(EngineError::new(
                    ErrorCode::NotFound,
                    format!("session not found: {}", session),
                ));
            }
            Ok(_) => {}
        }

        let job = match existing_job {
            Some(job) => job,
            None => jobs
                .create(&session, agent_id.clone(), now)
                .map_err(|e| EngineError::new(ErrorCode::JobCreateFailed, e.to_string()))?,
        };

        // Fire-and-forget: hand the job to a detached companion process.
        if args.asynchronous && !args.process_job {
            self.spawn_job_processor(&job, &args)?;
            return Ok(json!({
                "job_id": job.id,
                "session_name": session,
                "status": "pending",
                "sent": false,
                "delivered": false,
            }));
        }

        // FIFO: wait for this job's turn at the head of the session queue.
        let turn = {
            let started = self.clock.now();
            loop {
                match jobs
                    .try_take_turn(&job.id, self.clock.epoch_secs())
                    .map_err(|e| EngineError::new(ErrorCode::JobQueueFailed, e.to_string()))?
                {
                    TurnStatus::Acquired(turn) => break turn,
                    TurnStatus::Terminal(job) => return Ok(not_delivered(&job)),
                    TurnStatus::Waiting => {
                        if self.clock.now().duration_since(started) >= self.tuning.queue_max_wait {
                            return Err(EngineError::new(
                                ErrorCode::JobQueueFailed,
                                format!("queue turn timed out for session {}", session),
                            ));
                        }
                        tokio::time::sleep(self.tuning.queue_poll).await;
                    }
                }
            }
        };

        let running = jobs
            .set_status(&job.id, SendJobStatus::Running, "", self.clock.epoch_secs())
            .map_err(|e| EngineError::new(ErrorCode::JobStatusFailed, e.to_string()))?;
        if running.status != SendJobStatus::Running {
            // Canceled between the turn grant and the transition
            turn.release();
            return Ok(not_delivered(&running));
        }

        let baseline = if args.wait {
            let content = self
                .driver
                .capture_pane_tail(&session, self.tuning.capture_lines)
                .await
                .unwrap_or_default();
            Some(WaitBaseline::capture(content))
        } else {
            None
        };

        if let Err(e) = self.driver.send_keys(&session, &args.text, args.enter).await {
            let _ = jobs.set_status(
                &job.id,
                SendJobStatus::Failed,
                &e.to_string(),
                self.clock.epoch_secs(),
            );
            turn.release();
            return Err(EngineError::new(ErrorCode::SendFailed, e.to_string()));
        }

        let completed = jobs
            .set_status(&job.id, SendJobStatus::Completed, "", self.clock.epoch_secs())
            .map_err(|e| EngineError::new(ErrorCode::JobStatusFailed, e.to_string()))?;
        turn.release();

        let mut data = json!({
            "job_id": completed.id,
            "session_name": session,
            "status": completed.status.to_string(),
            "sent": true,
            "delivered": true,
        });
        if let Some(ref agent_id) = completed.agent_id {
            if let Some(obj) = data.as_object_mut() {
                obj.insert("agent_id".to_string(), json!(agent_id));
            }
        }

        if let Some(baseline) = baseline {
            let params = WaitParams {
                capture_lines: self.tuning.capture_lines,
                poll_interval: self.tuning.wait_poll,
                idle_threshold: args.idle_threshold,
                wait_timeout: args.wait_timeout,
            };
            let outcome =
                wait_for_response(&self.driver, &self.clock, &session, &params, &baseline, cancel)
                    .await;
            let response = serde_json::to_value(&outcome)
                .map_err(|e| EngineError::new(ErrorCode::EncodeFailed, e.to_string()))?;
            if let Some(obj) = data.as_object_mut() {
                obj.insert("response".to_string(), response);
            }
        }

        Ok(data)
    }

    /// Resolve the target session from a positional name or `--agent`.
    async fn resolve_send_target(
        &self,
        args: &SendArgs,
    ) -> Result<(String, Option<String>), EngineError> {
        match (&args.session_name, &args.agent) {
            (Some(session), None) => Ok((session.clone(), None)),
            (None, Some(agent)) => {
                let id = AgentId::parse(agent).map_err(|e| {
                    EngineError::new(ErrorCode::InvalidAgentId, e.to_string())
                })?;
                let matches = self
                    .driver
                    .sessions_with_tags(
                        &[
                            (tags::AMUX, "1"),
                            (tags::WORKSPACE, id.workspace_id.as_str()),
                            (tags::TAB, id.tab_id.as_str()),
                        ],
                        &[tags::ASSISTANT],
                    )
                    .await
                    .map_err(|e| {
                        EngineError::new(ErrorCode::SessionLookupFailed, e.to_string())
                    })?;
                match matches.as_slice() {
                    [session] => Ok((session.name.clone(), Some(agent.clone()))),
                    [] => Err(EngineError::new(
                        ErrorCode::NotFound,
                        format!("no session for agent: {}", agent),
                    )),
                    _ => Err(EngineError::new(
                        ErrorCode::NotFound,
                        format!("multiple sessions for agent: {}", agent),
                    )),
                }
            }
            _ => Err(EngineError::new(
                ErrorCode::UsageError,
                "exactly one of <session_name> or --agent is required",
            )),
        }
    }

    /// Spawn a detached copy of this binary to process the job. The child
    /// inherits the environment and receives the original text; the session
    /// comes from the stored job record.
    fn spawn_job_processor(&self, job: &SendJob, args: &SendArgs) -> Result<(), EngineError> {
        let exe = std::env::current_exe()
            .map_err(|e| EngineError::new(ErrorCode::JobDispatchFailed, e.to_string()))?;
        let mut cmd = std::process::Command::new(exe);
        cmd.args([
            "agent",
            "send",
            "--process-job",
            "--job-id",
            job.id.as_str(),
            "--text",
            args.text.as_str(),
            "--json",
        ]);
        if args.enter {
            cmd.arg("--enter");
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError::new(ErrorCode::JobDispatchFailed, e.to_string()))?;
        Ok(())
    }
}

fn not_delivered(job: &SendJob) -> serde_json::Value {
    json!({
        "job_id": job.id,
        "session_name": job.session_name,
        "status": job.status.to_string(),
        "sent": false,
        "delivered": false,
    })
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
