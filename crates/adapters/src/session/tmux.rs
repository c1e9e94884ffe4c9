// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real tmux driver

use super::{DriverOpts, SessionError, SessionState, TaggedSession, TmuxDriver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Field separator for list-sessions parsing (never appears in pane text or
/// session names).
const FIELD_SEP: char = '\u{1f}';

/// Driver shelling out to the `tmux` binary.
#[derive(Clone, Default)]
pub struct TmuxAdapter {
    opts: DriverOpts,
}

impl TmuxAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opts(opts: DriverOpts) -> Self {
        Self { opts }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, SessionError> {
        let mut cmd = Command::new("tmux");
        if let Some(ref socket) = self.opts.socket_name {
            cmd.arg("-L").arg(socket);
        }
        if let Some(ref config) = self.opts.config_file {
            cmd.arg("-f").arg(config);
        }
        cmd.args(args)
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))
    }
}

#[async_trait]
impl TmuxDriver for TmuxAdapter {
    async fn start_session(
        &self,
        name: &str,
        root: &Path,
        command: &str,
    ) -> Result<(), SessionError> {
        // Precondition: root must exist
        if !root.exists() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                root.display()
            )));
        }

        // A stale session under the deterministic name would shadow the new
        // one; kill it first.
        let existing = self.run(&["has-session", "-t", name]).await;
        if existing.map(|o| o.status.success()).unwrap_or(false) {
            tracing::warn!(session = name, "session already exists, killing first");
            let _ = self.run(&["kill-session", "-t", name]).await;
        }

        let root_str = root.to_string_lossy();
        let output = self
            .run(&["new-session", "-d", "-s", name, "-c", root_str.as_ref(), command])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = name, stderr = %stderr, "tmux spawn failed");
            return Err(SessionError::SpawnFailed(stderr.to_string()));
        }

        // Log stderr even on success - may contain useful warnings
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(session = name, stderr = %stderr, "tmux spawn stderr (non-fatal)");
        }

        Ok(())
    }

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let output = self.run(&["set-option", "-t", name, key, value]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::CommandFailed(format!(
                "set-option {} failed: {}",
                key, stderr
            )));
        }
        Ok(())
    }

    async fn session_state(&self, name: &str) -> Result<SessionState, SessionError> {
        let output = self.run(&["has-session", "-t", name]).await?;
        if !output.status.success() {
            return Ok(SessionState::default());
        }

        // Session exists; a pane is live while its process has not died.
        let panes = self
            .run(&["list-panes", "-t", name, "-F", "#{pane_dead}"])
            .await?;
        let has_live_pane = panes.status.success()
            && String::from_utf8_lossy(&panes.stdout)
                .lines()
                .any(|line| line.trim() == "0");

        Ok(SessionState {
            exists: true,
            has_live_pane,
        })
    }

    async fn capture_pane_tail(&self, name: &str, lines: u32) -> Result<String, SessionError> {
        let start = format!("-{}", lines);
        let output = self
            .run(&["capture-pane", "-t", name, "-p", "-S", &start])
            .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        with_enter: bool,
    ) -> Result<(), SessionError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = self.run(&["send-keys", "-t", name, "-l", "--", text]).await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }

        if with_enter {
            let output = self.run(&["send-keys", "-t", name, "Enter"]).await?;
            if !output.status.success() {
                return Err(SessionError::NotFound(name.to_string()));
            }
        }
        Ok(())
    }

    async fn send_interrupt(&self, name: &str) -> Result<(), SessionError> {
        let output = self.run(&["send-keys", "-t", name, "C-c"]).await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), SessionError> {
        let output = self.run(&["kill-session", "-t", name]).await?;
        if !output.status.success() {
            // Session might already be dead, which is fine
        }
        Ok(())
    }

    async fn sessions_with_tags(
        &self,
        tag_match: &[(&str, &str)],
        wanted_keys: &[&str],
    ) -> Result<Vec<TaggedSession>, SessionError> {
        // Query every key we either filter on or report.
        let mut keys: Vec<&str> = tag_match.iter().map(|(k, _)| *k).collect();
        for key in wanted_keys {
            if !keys.contains(key) {
                keys.push(key);
            }
        }

        let mut format = String::from("#{session_name}\u{1f}#{session_attached}\u{1f}#{session_created}");
        for key in &keys {
            format.push(FIELD_SEP);
            format.push_str(&format!("#{{{}}}", key));
        }

        let output = self.run(&["list-sessions", "-F", &format]).await?;
        if !output.status.success() {
            // No server running means no sessions
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut sessions = Vec::new();
        for line in stdout.lines() {
            let fields: Vec<&str> = line.split(FIELD_SEP).collect();
            if fields.len() != keys.len() + 3 {
                continue;
            }
            let mut tags = HashMap::new();
            for (key, value) in keys.iter().zip(&fields[3..]) {
                tags.insert(key.to_string(), value.to_string());
            }
            if tag_match
                .iter()
                .all(|(k, v)| tags.get(*k).map(|t| t.as_str() == *v).unwrap_or(false))
            {
                sessions.push(TaggedSession {
                    name: fields[0].to_string(),
                    attached: fields[1] != "0",
                    created_at: fields[2].parse().unwrap_or(0),
                    tags,
                });
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
