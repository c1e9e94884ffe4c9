// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-multiplexer session driver

mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeTmuxDriver};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from driver operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub exists: bool,
    /// At least one pane whose process has not died.
    pub has_live_pane: bool,
}

impl SessionState {
    /// A session that exists and can still receive keystrokes.
    pub fn is_ready(&self) -> bool {
        self.exists && self.has_live_pane
    }
}

/// A session matched by a tag query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSession {
    pub name: String,
    pub tags: HashMap<String, String>,
    pub attached: bool,
    /// Unix seconds, as reported by the multiplexer.
    pub created_at: u64,
}

/// Options applied to every tmux invocation.
#[derive(Debug, Clone, Default)]
pub struct DriverOpts {
    /// `-L <socket>`: named server socket (isolates test servers).
    pub socket_name: Option<String>,
    /// `-f <file>`: alternate config file.
    pub config_file: Option<String>,
}

/// Driver for detached multiplexer sessions.
///
/// All operations are recoverable: callers translate errors into their own
/// closed error-code sets.
#[async_trait]
pub trait TmuxDriver: Clone + Send + Sync + 'static {
    /// Create a detached session rooted at `root` running `command`.
    async fn start_session(
        &self,
        name: &str,
        root: &Path,
        command: &str,
    ) -> Result<(), SessionError>;

    /// Set a per-session tag key-value (a tmux user option).
    async fn set_session_tag(&self, name: &str, key: &str, value: &str)
        -> Result<(), SessionError>;

    /// Query existence and live-pane state.
    async fn session_state(&self, name: &str) -> Result<SessionState, SessionError>;

    /// Capture the last `lines` lines of the session's pane.
    async fn capture_pane_tail(&self, name: &str, lines: u32) -> Result<String, SessionError>;

    /// Send literal text, optionally followed by Enter.
    async fn send_keys(&self, name: &str, text: &str, with_enter: bool)
        -> Result<(), SessionError>;

    /// Send the interrupt key (Ctrl-C equivalent).
    async fn send_interrupt(&self, name: &str) -> Result<(), SessionError>;

    /// Kill a session. Succeeds if the session is already gone.
    async fn kill_session(&self, name: &str) -> Result<(), SessionError>;

    /// List sessions whose tags match every pair in `tag_match`, returning
    /// `wanted_keys` tag values for each.
    async fn sessions_with_tags(
        &self,
        tag_match: &[(&str, &str)],
        wanted_keys: &[&str],
    ) -> Result<Vec<TaggedSession>, SessionError>;
}

/// 16-byte content digest (truncated SHA-256).
pub fn content_hash(bytes: &[u8]) -> [u8; 16] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

/// Hex rendering of a content hash for event payloads.
pub fn hash_hex(hash: &[u8; 16]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Deterministic session name for a workspace tab.
///
/// tmux session names cannot contain `:` or `.`; any character outside
/// `[a-zA-Z0-9_-]` is replaced with a hyphen.
pub fn session_name(prefix: &str, workspace_id: &str, tab_id: &str) -> String {
    let raw = format!("{}-{}-{}", prefix, workspace_id, tab_id);
    raw.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect()
}
