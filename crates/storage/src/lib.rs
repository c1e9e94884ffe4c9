// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-storage: file-backed state shared across CLI processes
//!
//! Three single-file JSON stores live under the config home, each mutated
//! under an OS advisory lock with write-temp-then-rename durability: the
//! idempotency replay cache, the send-job queue, and the workspace records.

pub mod idempotency;
pub mod jobs;
pub mod lock;
pub mod workspace;

pub use idempotency::IdempotencyStore;
pub use jobs::{JobStoreConfig, QueueTurn, SendJobStore, TurnStatus};
pub use lock::{save_atomic, FileLock};
pub use workspace::WorkspaceStore;

use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
}
