// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent watch`: validation and wiring for the streaming observer.

use crate::context::{Engine, EngineError};
use amux_adapters::TmuxDriver;
use amux_core::{validate, Clock, ErrorCode};
use amux_observer::{watch as watch_loop, WatchEvent, WatchParams};
use std::time::Duration;
use tokio::sync::oneshot;

/// Arguments for `agent watch`.
#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub session_name: String,
    pub lines: u32,
    pub interval: Duration,
    pub idle_threshold: Duration,
    /// Zero disables heartbeats.
    pub heartbeat: Duration,
}

impl<D: TmuxDriver, C: Clock> Engine<D, C> {
    /// Stream watch events for a session until it exits or the shutdown
    /// signal fires. Events flow through `emit`; an emit failure ends the
    /// stream silently (the consumer hung up).
    pub async fn watch(
        &self,
        args: WatchArgs,
        shutdown: oneshot::Receiver<()>,
        emit: &mut dyn FnMut(&WatchEvent) -> std::io::Result<()>,
    ) -> Result<(), EngineError> {
        if args.lines == 0 {
            return Err(EngineError::new(
                ErrorCode::InvalidLines,
                "--lines must be positive",
            ));
        }
        if !validate::positive(args.interval) {
            return Err(EngineError::new(
                ErrorCode::InvalidInterval,
                "--interval must be positive",
            ));
        }
        if !validate::positive(args.idle_threshold) {
            return Err(EngineError::new(
                ErrorCode::InvalidIdleThreshold,
                "--idle-threshold must be positive",
            ));
        }

        match self.driver.session_state(&args.session_name).await {
            Err(e) => {
                return Err(EngineError::new(
                    ErrorCode::SessionLookupFailed,
                    e.to_string(),
                ));
            }
            Ok(state) if !state.exists => {
                return Err(EngineError::new(
                    ErrorCode::NotFound,
                    format!("session not found: {}", args.session_name),
                ));
            }
            Ok(_) => {}
        }

        let params = WatchParams {
            lines: args.lines,
            interval: args.interval,
            idle_threshold: args.idle_threshold,
            heartbeat: args.heartbeat,
        };
        let _ = watch_loop(
            &self.driver,
            &self.clock,
            &args.session_name,
            &params,
            shutdown,
            emit,
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
