// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent stop`: interrupt, wait out the grace period, then kill.

use crate::context::{Engine, EngineError};
use amux_adapters::TmuxDriver;
use amux_core::{Clock, ErrorCode};
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;

/// Poll cadence while waiting for a cooperative exit.
const STOP_POLL: Duration = Duration::from_millis(25);

/// Arguments for `agent stop`.
#[derive(Debug, Clone)]
pub struct StopArgs {
    pub session_name: String,
    pub grace_period: Duration,
}

impl<D: TmuxDriver, C: Clock> Engine<D, C> {
    /// Stop a session: interrupt first, kill if it lingers past the grace
    /// period. Success means the session is gone either way.
    pub async fn stop(
        &self,
        args: StopArgs,
        _cancel: oneshot::Receiver<()>,
    ) -> Result<serde_json::Value, EngineError> {
        let session = &args.session_name;
        match self.driver.session_state(session).await {
            Err(e) => {
                return Err(EngineError::new(ErrorCode::StopFailed, e.to_string()));
            }
            Ok(state) if !state.exists => {
                return Err(EngineError::new(
                    ErrorCode::NotFound,
                    format!("session not found: {}", session),
                ));
            }
            Ok(_) => {}
        }

        // A failed interrupt is not fatal: fall through to the kill.
        let interrupted = self.driver.send_interrupt(session).await.is_ok();
        if interrupted {
            let deadline = self.clock.now() + args.grace_period;
            while self.clock.now() < deadline {
                match self.driver.session_state(session).await {
                    Ok(state) if !state.exists => {
                        return Ok(json!({
                            "session_name": session,
                            "stopped": true,
                            "forced": false,
                        }));
                    }
                    Ok(_) | Err(_) => {}
                }
                tokio::time::sleep(STOP_POLL).await;
            }
        }

        self.driver
            .kill_session(session)
            .await
            .map_err(|e| EngineError::new(ErrorCode::StopFailed, e.to_string()))?;

        Ok(json!({
            "session_name": session,
            "stopped": true,
            "forced": true,
        }))
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
