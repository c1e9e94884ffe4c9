// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-adapters: terminal-multiplexer driver
//!
//! The control plane talks to tmux exclusively through the [`TmuxDriver`]
//! trait defined here. The real implementation shells out to the `tmux`
//! binary; tests substitute the recording fake.

pub mod session;

pub use session::{
    content_hash, hash_hex, session_name, DriverOpts, SessionError, SessionState, TaggedSession,
    TmuxAdapter, TmuxDriver,
};

#[cfg(any(test, feature = "test-support"))]
pub use session::{DriverCall, FakeTmuxDriver};
