// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::context::{Engine, Tuning};
use amux_adapters::FakeTmuxDriver;
use amux_core::{SystemClock, Workspace};
use std::path::PathBuf;
use std::time::Duration;

/// Millisecond-scale tuning so polling loops finish fast under test.
pub(crate) fn fast_tuning() -> Tuning {
    Tuning {
        ready_poll: Duration::from_millis(1),
        ready_wait: Duration::from_millis(30),
        delivery_wait: Duration::from_millis(50),
        queue_poll: Duration::from_millis(1),
        queue_max_wait: Duration::from_secs(2),
        capture_lines: 200,
        wait_poll: Duration::from_millis(1),
    }
}

pub(crate) fn engine(dir: &tempfile::TempDir) -> Engine<FakeTmuxDriver, SystemClock> {
    Engine::new(
        FakeTmuxDriver::new(),
        SystemClock,
        dir.path().to_path_buf(),
        "test",
    )
    .with_tuning(fast_tuning())
}

pub(crate) fn seed_workspace(engine: &Engine<FakeTmuxDriver, SystemClock>, id: &str) {
    engine
        .workspaces()
        .save(&Workspace::new(id, PathBuf::from("/tmp"), "claude"))
        .unwrap_or_else(|e| panic!("seed workspace: {}", e));
}
