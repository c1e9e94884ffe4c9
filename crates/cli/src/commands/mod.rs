// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers.

pub mod agent;
pub mod workspace;

use amux_adapters::{DriverOpts, TmuxAdapter};
use amux_core::SystemClock;
use amux_engine::Engine;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;

/// Global flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub json: bool,
    pub request_id: Option<String>,
    pub timeout: Option<Duration>,
    pub quiet: bool,
    pub no_color: bool,
}

impl GlobalOpts {
    /// Request id for the envelope: the flag value, or a generated one in
    /// JSON mode.
    pub fn request_id(&self) -> Option<String> {
        match &self.request_id {
            Some(id) => Some(id.clone()),
            None if self.json => Some(amux_core::new_request_id()),
            None => None,
        }
    }
}

/// clap value parser for duration flags (`250ms`, `5s`, `2m`, `1h`).
pub fn parse_duration_flag(s: &str) -> Result<Duration, String> {
    amux_core::validate::parse_duration(s)
}

/// Config home: `AMUX_HOME`, else the platform config dir, else `~/.amux`.
pub fn config_home() -> PathBuf {
    if let Ok(home) = std::env::var("AMUX_HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    dirs::config_dir()
        .map(|dir| dir.join("amux"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".amux")
        })
}

/// Build the production engine: real tmux driver, system clock.
pub fn build_engine() -> Engine<TmuxAdapter, SystemClock> {
    let driver_opts = DriverOpts {
        socket_name: std::env::var("AMUX_TMUX_SOCKET").ok().filter(|s| !s.is_empty()),
        config_file: std::env::var("AMUX_TMUX_CONFIG").ok().filter(|s| !s.is_empty()),
    };
    Engine::new(
        TmuxAdapter::with_opts(driver_opts),
        SystemClock,
        config_home(),
        env!("CARGO_PKG_VERSION"),
    )
}

/// Cancellation wired to SIGINT/SIGTERM and the optional `--timeout`.
pub fn cancel_signal(timeout: Option<Duration>) -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let interrupted = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        match timeout {
            Some(limit) => {
                tokio::select! {
                    _ = interrupted => {}
                    _ = tokio::time::sleep(limit) => {}
                }
            }
            None => interrupted.await,
        }
        let _ = tx.send(());
    });
    rx
}
