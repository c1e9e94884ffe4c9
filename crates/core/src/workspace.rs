// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace and tab records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A workspace: a working directory tied to a project, plus the tabs (live
/// assistant sessions) opened against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub root: PathBuf,
    /// Assistant used when `--assistant` is omitted.
    #[serde(default)]
    pub default_assistant: String,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, root: PathBuf, default_assistant: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root,
            default_assistant: default_assistant.into(),
            tabs: Vec::new(),
        }
    }
}

/// One live assistant session recorded against a workspace.
///
/// Appended only after the underlying tmux session has been verified live
/// and tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: String,
    pub assistant: String,
    pub tab_name: String,
    pub session_name: String,
    pub status: String,
    /// Unix seconds.
    pub created_at: u64,
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
