// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assistant command table.
//!
//! Maps an assistant name to the command line executed when its session is
//! created. Built-in defaults cover the stock assistants; a TOML table in
//! the config home overrides or extends them.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Built-in assistant commands.
const BUILTIN: &[(&str, &str)] = &[("claude", "claude"), ("codex", "codex")];

#[derive(Debug, Default, Deserialize)]
struct AssistantFile {
    #[serde(default)]
    assistants: BTreeMap<String, String>,
}

/// Resolved name → command table.
#[derive(Debug, Clone)]
pub struct AssistantTable {
    commands: BTreeMap<String, String>,
}

impl Default for AssistantTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AssistantTable {
    /// Only the built-in assistants.
    pub fn builtin() -> Self {
        let commands = BUILTIN
            .iter()
            .map(|(name, cmd)| (name.to_string(), cmd.to_string()))
            .collect();
        Self { commands }
    }

    /// Built-ins overlaid with entries parsed from a TOML document:
    ///
    /// ```toml
    /// [assistants]
    /// claude = "claude --permission-mode plan"
    /// aider = "aider --no-auto-commits"
    /// ```
    ///
    /// A malformed document is ignored; configuration must never block the
    /// control plane.
    pub fn from_toml(content: &str) -> Self {
        let mut table = Self::builtin();
        if let Ok(file) = toml::from_str::<AssistantFile>(content) {
            for (name, cmd) in file.assistants {
                table.commands.insert(name, cmd);
            }
        }
        table
    }

    /// Look up the command line for an assistant name.
    pub fn command(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|s| s.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
#[path = "assistant_tests.rs"]
mod tests;
