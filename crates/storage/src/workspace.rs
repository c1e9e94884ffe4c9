// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace records, one JSON file per workspace.

use crate::lock::{save_atomic, FileLock};
use crate::StoreError;
use amux_core::{TabInfo, Workspace};
use std::path::{Path, PathBuf};

/// File-backed workspace store under `<home>/workspaces/`.
pub struct WorkspaceStore {
    dir: PathBuf,
    lock_path: PathBuf,
}

impl WorkspaceStore {
    pub fn new(home: &Path) -> Self {
        Self {
            dir: home.join("workspaces"),
            lock_path: home.join("workspaces.lock"),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Load a workspace by id.
    pub fn load(&self, id: &str) -> Result<Option<Workspace>, StoreError> {
        let _lock = FileLock::shared(&self.lock_path)?;
        self.load_unlocked(id)
    }

    fn load_unlocked(&self, id: &str) -> Result<Option<Workspace>, StoreError> {
        let path = self.path_for(id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Save a workspace, replacing any existing record.
    pub fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let _lock = FileLock::exclusive(&self.lock_path)?;
        self.save_unlocked(workspace)
    }

    fn save_unlocked(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(workspace)?;
        save_atomic(&self.path_for(&workspace.id), &bytes)?;
        Ok(())
    }

    /// All workspaces, sorted by id.
    pub fn list(&self) -> Result<Vec<Workspace>, StoreError> {
        let _lock = FileLock::shared(&self.lock_path)?;
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut workspaces = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = std::fs::read(&path)?;
            match serde_json::from_slice::<Workspace>(&bytes) {
                Ok(ws) => workspaces.push(ws),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed workspace file");
                }
            }
        }
        workspaces.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workspaces)
    }

    /// Atomically append one tab to a workspace's record.
    ///
    /// Load-modify-save happens under the exclusive lock so two processes
    /// appending concurrently cannot lose a tab.
    pub fn append_open_tab(&self, id: &str, tab: TabInfo) -> Result<(), StoreError> {
        let _lock = FileLock::exclusive(&self.lock_path)?;
        let mut workspace = self
            .load_unlocked(id)?
            .ok_or_else(|| StoreError::NotFound(format!("workspace {}", id)))?;
        workspace.tabs.push(tab);
        self.save_unlocked(&workspace)
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
