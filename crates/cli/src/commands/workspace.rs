// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux workspace` subcommands.

use super::{build_engine, GlobalOpts};
use crate::output;
use amux_core::{validate, ErrorCode, Workspace};
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Register a workspace
    Add {
        /// Workspace id
        id: String,
        /// Project root directory
        #[arg(long)]
        root: PathBuf,
        /// Default assistant for `agent run`
        #[arg(long, default_value = "claude")]
        assistant: String,
    },
    /// List registered workspaces
    List,
}

pub async fn handle(args: WorkspaceArgs, opts: &GlobalOpts) -> i32 {
    let engine = build_engine();
    match args.command {
        WorkspaceCommand::Add {
            id,
            root,
            assistant,
        } => {
            if !validate::valid_workspace_id(&id) {
                return output::emit_error(
                    opts,
                    ErrorCode::UsageError,
                    &format!("invalid workspace id: {}", id),
                );
            }
            let root = match std::fs::canonicalize(&root) {
                Ok(root) => root,
                Err(e) => {
                    return output::emit_error(
                        opts,
                        ErrorCode::UsageError,
                        &format!("invalid --root '{}': {}", root.display(), e),
                    );
                }
            };
            let assistant = assistant.to_lowercase();
            let workspace = Workspace::new(&id, root.clone(), &assistant);
            match engine.workspaces().save(&workspace) {
                Ok(()) => output::emit_success(
                    opts,
                    json!({
                        "id": id,
                        "root": root,
                        "default_assistant": assistant,
                    }),
                ),
                Err(e) => output::emit_error(opts, ErrorCode::InitFailed, &e.to_string()),
            }
        }

        WorkspaceCommand::List => match engine.workspaces().list() {
            Ok(workspaces) => {
                let items: Vec<serde_json::Value> = workspaces
                    .iter()
                    .map(|ws| {
                        json!({
                            "id": ws.id,
                            "root": ws.root,
                            "default_assistant": ws.default_assistant,
                            "tabs": ws.tabs.len(),
                        })
                    })
                    .collect();
                output::emit_success(opts, json!({ "workspaces": items }))
            }
            Err(e) => output::emit_error(opts, ErrorCode::InitFailed, &e.to_string()),
        },
    }
}
