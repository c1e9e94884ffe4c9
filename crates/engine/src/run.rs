// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent run`: create, tag, verify, prompt, and record a new session.

use crate::context::{tags, Engine, EngineError, SESSION_PREFIX};
use amux_adapters::{session_name, TmuxDriver};
use amux_core::{generate_tab_id, validate, Clock, ErrorCode, TabInfo};
use amux_observer::{wait_for_response, WaitBaseline, WaitParams};
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;

/// Codex renders its input line with this marker.
const CODEX_PROMPT_MARKER: &str = "› ";
/// Lines captured for readiness and delivery polls.
const READY_CAPTURE_LINES: u32 = 5;

/// Arguments for `agent run`.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub workspace: String,
    pub assistant: String,
    pub tab_name: Option<String>,
    pub prompt: Option<String>,
    pub wait: bool,
    pub wait_timeout: Duration,
    pub idle_threshold: Duration,
}

impl<D: TmuxDriver, C: Clock> Engine<D, C> {
    /// Create a detached assistant session for a workspace tab.
    pub async fn run(
        &self,
        args: RunArgs,
        cancel: oneshot::Receiver<()>,
    ) -> Result<serde_json::Value, EngineError> {
        let assistant = args.assistant.to_lowercase();
        if !validate::valid_workspace_id(&args.workspace) {
            return Err(EngineError::new(
                ErrorCode::UsageError,
                format!("invalid workspace id: {}", args.workspace),
            ));
        }
        if !validate::valid_assistant_name(&assistant) {
            return Err(EngineError::new(
                ErrorCode::UsageError,
                format!("invalid assistant name: {}", assistant),
            ));
        }
        let prompt = args.prompt.clone().unwrap_or_default();
        if args.wait {
            if prompt.is_empty() {
                return Err(EngineError::new(
                    ErrorCode::UsageError,
                    "--wait requires --prompt",
                ));
            }
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

        let workspace = self
            .workspaces()
            .load(&args.workspace)
            .map_err(|e| EngineError::new(ErrorCode::InitFailed, e.to_string()))?
            .ok_or_else(|| {
                EngineError::new(
                    ErrorCode::NotFound,
                    format!("workspace not found: {}", args.workspace),
                )
            })?;
        let assistants = self.assistants();
        let command = assistants.command(&assistant).ok_or_else(|| {
            EngineError::new(
                ErrorCode::UnknownAssistant,
                format!("unknown assistant: {}", assistant),
            )
        })?;

        let tab_id = generate_tab_id(&self.clock);
        let session = session_name(SESSION_PREFIX, &workspace.id, &tab_id);

        self.driver
            .start_session(&session, &workspace.root, command)
            .await
            .map_err(|e| EngineError::new(ErrorCode::SessionFailed, e.to_string()))?;

        // Tag writes happen before the tab is persisted; a failure here
        // must leave neither a session nor a tab behind.
        let created_at = self.clock.epoch_secs();
        let tag_values = [
            (tags::AMUX, "1".to_string()),
            (tags::WORKSPACE, workspace.id.clone()),
            (tags::TAB, tab_id.clone()),
            (tags::TYPE, "agent".to_string()),
            (tags::ASSISTANT, assistant.clone()),
            (tags::CREATED_AT, created_at.to_string()),
        ];
        for (key, value) in &tag_values {
            if let Err(e) = self.driver.set_session_tag(&session, key, value).await {
                let _ = self.driver.kill_session(&session).await;
                return Err(EngineError::new(
                    ErrorCode::SessionTagFailed,
                    format!("tagging {} failed: {}", key, e),
                ));
            }
        }

        // Startup verification: the assistant process must still be up.
        match self.driver.session_state(&session).await {
            Err(e) => {
                let _ = self.driver.kill_session(&session).await;
                return Err(EngineError::new(
                    ErrorCode::SessionLookupFailed,
                    e.to_string(),
                ));
            }
            Ok(state) if !state.is_ready() => {
                let _ = self.driver.kill_session(&session).await;
                return Err(EngineError::new(
                    ErrorCode::SessionExited,
                    format!("session exited during startup: {}", session),
                ));
            }
            Ok(_) => {}
        }

        // Baseline for the wait diff: after startup readiness, before the
        // prompt lands. Startup banner output is deliberately inside it.
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

        if !prompt.is_empty() {
            self.wait_for_pane_ready(&session, &assistant).await;
            let pre_send = if assistant == "codex" {
                self.driver
                    .capture_pane_tail(&session, READY_CAPTURE_LINES)
                    .await
                    .unwrap_or_default()
            } else {
                String::new()
            };
            if let Err(e) = self.driver.send_keys(&session, &prompt, true).await {
                let _ = self.driver.kill_session(&session).await;
                return Err(EngineError::new(ErrorCode::PromptSendFailed, e.to_string()));
            }
            if assistant == "codex" && !self.confirm_prompt_delivery(&session, &pre_send).await {
                tracing::warn!(session = %session, "prompt not visible after send, resending once");
                if let Err(e) = self.driver.send_keys(&session, &prompt, true).await {
                    let _ = self.driver.kill_session(&session).await;
                    return Err(EngineError::new(ErrorCode::PromptSendFailed, e.to_string()));
                }
            }
        }

        let tab_name = args.tab_name.clone().unwrap_or_else(|| assistant.clone());
        let tab = TabInfo {
            id: tab_id.clone(),
            assistant: assistant.clone(),
            tab_name: tab_name.clone(),
            session_name: session.clone(),
            status: "running".to_string(),
            created_at,
        };
        if let Err(e) = self.workspaces().append_open_tab(&workspace.id, tab) {
            let _ = self.driver.kill_session(&session).await;
            return Err(EngineError::new(
                ErrorCode::MetadataSaveFailed,
                e.to_string(),
            ));
        }

        let mut data = json!({
            "agent_id": format!("{}:{}", workspace.id, tab_id),
            "workspace": workspace.id,
            "tab_id": tab_id,
            "tab_name": tab_name,
            "session_name": session,
            "assistant": assistant,
        });

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

    /// Poll the pane until it looks ready for input. The timeout is
    /// advisory; the caller proceeds either way.
    async fn wait_for_pane_ready(&self, session: &str, assistant: &str) {
        let deadline = self.clock.now() + self.tuning.ready_wait;
        let mut last: Option<String> = None;
        while self.clock.now() < deadline {
            if let Ok(text) = self
                .driver
                .capture_pane_tail(session, READY_CAPTURE_LINES)
                .await
            {
                if assistant == "codex" {
                    if text
                        .lines()
                        .any(|l| l.trim_start().starts_with(CODEX_PROMPT_MARKER))
                    {
                        return;
                    }
                } else if !text.trim().is_empty() {
                    // Two identical non-empty rounds count as stable
                    if last.as_deref() == Some(text.as_str()) {
                        return;
                    }
                    last = Some(text);
                }
            }
            tokio::time::sleep(self.tuning.ready_poll).await;
        }
        tracing::debug!(session, assistant, "pane readiness timed out, proceeding");
    }

    /// After sending to codex, confirm the pane advanced past the prompt
    /// marker. Returns false when the pane never moved.
    async fn confirm_prompt_delivery(&self, session: &str, pre_send: &str) -> bool {
        let deadline = self.clock.now() + self.tuning.delivery_wait;
        while self.clock.now() < deadline {
            if let Ok(text) = self
                .driver
                .capture_pane_tail(session, READY_CAPTURE_LINES)
                .await
            {
                let last_line = text.lines().rev().find(|l| !l.trim().is_empty());
                let at_prompt = matches!(
                    last_line,
                    Some(l) if l.trim_start().starts_with(CODEX_PROMPT_MARKER)
                );
                if !at_prompt || text != pre_send {
                    return true;
                }
            }
            tokio::time::sleep(self.tuning.ready_poll).await;
        }
        false
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
