// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake tmux driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SessionError, SessionState, TaggedSession, TmuxDriver};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    StartSession {
        name: String,
        root: PathBuf,
        command: String,
    },
    SetSessionTag {
        name: String,
        key: String,
        value: String,
    },
    SessionState {
        name: String,
    },
    CapturePaneTail {
        name: String,
        lines: u32,
    },
    SendKeys {
        name: String,
        text: String,
        with_enter: bool,
    },
    SendInterrupt {
        name: String,
    },
    KillSession {
        name: String,
    },
    SessionsWithTags,
}

#[derive(Debug, Clone)]
struct FakeSession {
    root: PathBuf,
    command: String,
    tags: BTreeMap<String, String>,
    state: SessionState,
    /// Pane frames consumed one per capture; the last frame is sticky.
    frames: VecDeque<String>,
    /// When set, a send_interrupt makes the session disappear.
    interrupt_exits: bool,
    attached: bool,
    created_at: u64,
}

impl FakeSession {
    fn live() -> Self {
        Self {
            root: PathBuf::new(),
            command: String::new(),
            tags: BTreeMap::new(),
            state: SessionState {
                exists: true,
                has_live_pane: true,
            },
            frames: VecDeque::new(),
            interrupt_exits: false,
            attached: false,
            created_at: 0,
        }
    }
}

#[derive(Default)]
struct FakeDriverState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<DriverCall>,
    /// op name → remaining forced failures
    failures: HashMap<String, usize>,
    /// Initial pane frame seeded into sessions created via start_session.
    default_pane: Option<String>,
    /// When set, started sessions come up without a live pane.
    spawn_dead: bool,
}

/// Recording fake with scripted pane content and failure injection.
#[derive(Clone, Default)]
pub struct FakeTmuxDriver {
    inner: Arc<Mutex<FakeDriverState>>,
}

impl FakeTmuxDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.lock().calls.clone()
    }

    /// Texts of recorded send_keys calls, in order.
    pub fn sent_keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::SendKeys { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Count of recorded calls of one kind (by op name).
    pub fn call_count(&self, op: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| op_name(c) == op)
            .count()
    }

    /// Register a live session.
    pub fn add_session(&self, name: &str) {
        self.inner
            .lock()
            .sessions
            .insert(name.to_string(), FakeSession::live());
    }

    /// Queue a pane frame; captures consume frames in order, repeating the
    /// last one once the queue drains.
    pub fn push_frame(&self, name: &str, content: &str) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.frames.push_back(content.to_string());
        }
    }

    /// Replace all frames with a single static pane.
    pub fn set_pane(&self, name: &str, content: &str) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.frames.clear();
            session.frames.push_back(content.to_string());
        }
    }

    /// Override the observable state of a session.
    pub fn set_state(&self, name: &str, exists: bool, has_live_pane: bool) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.state = SessionState {
                exists,
                has_live_pane,
            };
        }
    }

    /// Make the session disappear entirely (state queries report missing,
    /// captures fail).
    pub fn remove_session(&self, name: &str) {
        self.inner.lock().sessions.remove(name);
    }

    /// Make send_interrupt terminate the session (cooperative exit).
    pub fn set_interrupt_exits(&self, name: &str, exits: bool) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.interrupt_exits = exits;
        }
    }

    /// Set a tag directly (as if a previous process had tagged the session).
    pub fn set_tag(&self, name: &str, key: &str, value: &str) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.tags.insert(key.to_string(), value.to_string());
        }
    }

    /// Tags recorded for a session, in insertion-independent order.
    pub fn tags(&self, name: &str) -> BTreeMap<String, String> {
        self.inner
            .lock()
            .sessions
            .get(name)
            .map(|s| s.tags.clone())
            .unwrap_or_default()
    }

    /// Force the next `count` calls of `op` to fail with CommandFailed.
    pub fn fail_times(&self, op: &str, count: usize) {
        self.inner.lock().failures.insert(op.to_string(), count);
    }

    /// Seed sessions created via start_session with an initial pane frame.
    pub fn set_default_pane(&self, content: &str) {
        self.inner.lock().default_pane = Some(content.to_string());
    }

    /// Make started sessions come up without a live pane (crashed command).
    pub fn set_spawn_dead(&self, dead: bool) {
        self.inner.lock().spawn_dead = dead;
    }

    /// Name recorded by the most recent start_session call.
    pub fn started_session_name(&self) -> Option<String> {
        self.inner.lock().calls.iter().rev().find_map(|c| match c {
            DriverCall::StartSession { name, .. } => Some(name.clone()),
            _ => None,
        })
    }

    fn check_failure(&self, op: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if let Some(remaining) = inner.failures.get_mut(op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SessionError::CommandFailed(format!("{} forced failure", op)));
            }
        }
        Ok(())
    }
}

fn op_name(call: &DriverCall) -> &'static str {
    match call {
        DriverCall::StartSession { .. } => "start_session",
        DriverCall::SetSessionTag { .. } => "set_session_tag",
        DriverCall::SessionState { .. } => "session_state",
        DriverCall::CapturePaneTail { .. } => "capture_pane_tail",
        DriverCall::SendKeys { .. } => "send_keys",
        DriverCall::SendInterrupt { .. } => "send_interrupt",
        DriverCall::KillSession { .. } => "kill_session",
        DriverCall::SessionsWithTags => "sessions_with_tags",
    }
}

#[async_trait]
impl TmuxDriver for FakeTmuxDriver {
    async fn start_session(
        &self,
        name: &str,
        root: &Path,
        command: &str,
    ) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::StartSession {
                name: name.to_string(),
                root: root.to_path_buf(),
                command: command.to_string(),
            });
        }
        self.check_failure("start_session")?;

        let mut session = FakeSession::live();
        session.root = root.to_path_buf();
        session.command = command.to_string();
        let mut inner = self.inner.lock();
        if let Some(ref pane) = inner.default_pane {
            session.frames.push_back(pane.clone());
        }
        if inner.spawn_dead {
            session.state.has_live_pane = false;
        }
        inner.sessions.insert(name.to_string(), session);
        Ok(())
    }

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::SetSessionTag {
                name: name.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        self.check_failure("set_session_tag")?;

        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(name) {
            Some(session) => {
                session.tags.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn session_state(&self, name: &str) -> Result<SessionState, SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::SessionState {
                name: name.to_string(),
            });
        }
        self.check_failure("session_state")?;

        let inner = self.inner.lock();
        Ok(inner
            .sessions
            .get(name)
            .map(|s| s.state)
            .unwrap_or_default())
    }

    async fn capture_pane_tail(&self, name: &str, lines: u32) -> Result<String, SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::CapturePaneTail {
                name: name.to_string(),
                lines,
            });
        }
        self.check_failure("capture_pane_tail")?;

        let mut inner = self.inner.lock();
        let session = inner
            .sessions
            .get_mut(name)
            .filter(|s| s.state.exists)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;

        let frame = if session.frames.len() > 1 {
            session.frames.pop_front().unwrap_or_default()
        } else {
            session.frames.front().cloned().unwrap_or_default()
        };

        let all: Vec<&str> = frame.lines().collect();
        let start = all.len().saturating_sub(lines as usize);
        Ok(all[start..].join("\n"))
    }

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        with_enter: bool,
    ) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::SendKeys {
                name: name.to_string(),
                text: text.to_string(),
                with_enter,
            });
        }
        self.check_failure("send_keys")?;

        let inner = self.inner.lock();
        if !inner.sessions.contains_key(name) {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_interrupt(&self, name: &str) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::SendInterrupt {
                name: name.to_string(),
            });
        }
        self.check_failure("send_interrupt")?;

        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(name) {
            Some(session) => {
                if session.interrupt_exits {
                    session.state = SessionState::default();
                }
                Ok(())
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn kill_session(&self, name: &str) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::KillSession {
                name: name.to_string(),
            });
        }
        self.check_failure("kill_session")?;

        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.get_mut(name) {
            session.state = SessionState::default();
        }
        Ok(())
    }

    async fn sessions_with_tags(
        &self,
        tag_match: &[(&str, &str)],
        wanted_keys: &[&str],
    ) -> Result<Vec<TaggedSession>, SessionError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::SessionsWithTags);
        }
        self.check_failure("sessions_with_tags")?;

        let inner = self.inner.lock();
        let mut result = Vec::new();
        for (name, session) in &inner.sessions {
            if !session.state.exists {
                continue;
            }
            let matches = tag_match
                .iter()
                .all(|(k, v)| session.tags.get(*k).map(|t| t.as_str() == *v).unwrap_or(false));
            if !matches {
                continue;
            }
            let mut tags = HashMap::new();
            for key in tag_match.iter().map(|(k, _)| *k).chain(wanted_keys.iter().copied()) {
                if let Some(value) = session.tags.get(key) {
                    tags.insert(key.to_string(), value.clone());
                }
            }
            result.push(TaggedSession {
                name: name.clone(),
                tags,
                attached: session.attached,
                created_at: session.created_at,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
