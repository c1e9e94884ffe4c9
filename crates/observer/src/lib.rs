// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-observer: pane observation
//!
//! Polls pane snapshots, hashes them, filters terminal chrome and progress
//! noise, computes line deltas, and detects explicit "needs input" prompts.
//! Two consumers sit on top: the streaming watch loop and the wait loop
//! that produces a single terminal result.

pub mod delta;
pub mod filter;
pub mod snapshot;
pub mod wait;
pub mod watch;

pub use delta::compute_new_lines;
pub use filter::{compact_agent_output, detect_needs_input, is_progress_noise};
pub use snapshot::{latest_line, stable_hash, summarize};
pub use wait::{wait_for_response, WaitBaseline, WaitOutcome, WaitParams, WaitStatus};
pub use watch::{watch, WatchEvent, WatchParams};
