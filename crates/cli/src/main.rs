// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux - control plane for tmux-hosted coding assistants

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{agent, workspace};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "amux",
    version,
    about = "amux - drive coding assistants inside detached tmux sessions"
)]
struct Cli {
    /// Emit a machine-readable JSON envelope on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Request id echoed into the response envelope
    #[arg(long, global = true, value_name = "ID")]
    request_id: Option<String>,

    /// Change to <dir> before doing anything
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Cancel interactive waits after this long (e.g. 90s)
    #[arg(long, global = true, value_parser = commands::parse_duration_flag)]
    timeout: Option<Duration>,

    /// Suppress non-essential human output
    #[arg(long, global = true)]
    quiet: bool,

    /// Disable ANSI colors in human output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run, message, observe, and stop assistant sessions
    Agent(agent::AgentArgs),
    /// Workspace management
    Workspace(workspace::WorkspaceArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(ref dir) = cli.cwd {
        if let Err(e) = std::env::set_current_dir(dir) {
            let opts = commands::GlobalOpts::from_cli(&cli);
            let code = output::emit_error(
                &opts,
                amux_core::ErrorCode::UsageError,
                &format!("cannot change to directory '{}': {}", dir.display(), e),
            );
            std::process::exit(code);
        }
    }

    let opts = commands::GlobalOpts::from_cli(&cli);

    // Human mode may log; JSON mode must keep stderr silent.
    if !opts.json && std::env::var("AMUX_LOG").is_ok() {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_env("AMUX_LOG"))
            .with_writer(std::io::stderr)
            .try_init();
    }

    let code = match cli.command {
        Commands::Agent(args) => agent::handle(args, &opts).await,
        Commands::Workspace(args) => workspace::handle(args, &opts).await,
    };
    std::process::exit(code);
}

impl commands::GlobalOpts {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            request_id: cli.request_id.clone(),
            timeout: cli.timeout,
            quiet: cli.quiet,
            no_color: cli.no_color,
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
