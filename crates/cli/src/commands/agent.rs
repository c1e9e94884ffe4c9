// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux agent` subcommands.

use super::{build_engine, cancel_signal, parse_duration_flag, GlobalOpts};
use crate::output;
use amux_adapters::TmuxDriver;
use amux_core::{Clock, ErrorCode};
use amux_engine::{Engine, RunArgs, SendArgs, StopArgs, WatchArgs};
use clap::{Args, Subcommand};
use std::io::Write;
use std::time::Duration;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Start an assistant in a new detached session
    Run {
        /// Workspace id
        #[arg(long)]
        workspace: String,
        /// Assistant name (claude, codex, ...)
        #[arg(long)]
        assistant: String,
        /// Tab name (defaults to the assistant name)
        #[arg(long = "name")]
        name: Option<String>,
        /// Initial prompt to send once the pane is ready
        #[arg(long)]
        prompt: Option<String>,
        /// Wait for the assistant's response before returning
        #[arg(long)]
        wait: bool,
        /// Overall wait ceiling
        #[arg(long, default_value = "120s", value_parser = parse_duration_flag)]
        wait_timeout: Duration,
        /// Quiet period that counts as "response finished"
        #[arg(long, default_value = "5s", value_parser = parse_duration_flag)]
        idle_threshold: Duration,
        /// Replay key for safe re-invocation (requires --json)
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Send text to a running session
    Send {
        /// Target session name (or use --agent)
        session_name: Option<String>,
        /// Target agent id (<workspace>:<tab>)
        #[arg(long)]
        agent: Option<String>,
        /// Text to deliver, preserved verbatim
        #[arg(long)]
        text: String,
        /// Append Enter after the text
        #[arg(long)]
        enter: bool,
        /// Queue the send and return immediately
        #[arg(long = "async")]
        r#async: bool,
        /// Wait for the assistant's response before returning
        #[arg(long)]
        wait: bool,
        /// Overall wait ceiling
        #[arg(long, default_value = "120s", value_parser = parse_duration_flag)]
        wait_timeout: Duration,
        /// Quiet period that counts as "response finished"
        #[arg(long, default_value = "5s", value_parser = parse_duration_flag)]
        idle_threshold: Duration,
        /// Replay key for safe re-invocation (requires --json)
        #[arg(long)]
        idempotency_key: Option<String>,
        /// Internal: process an already-queued job
        #[arg(long, hide = true)]
        process_job: bool,
        /// Internal: id of the queued job to process
        #[arg(long, hide = true)]
        job_id: Option<String>,
    },
    /// Interrupt a session, killing it if it lingers
    Stop {
        session_name: String,
        /// How long to wait for a cooperative exit
        #[arg(long, default_value = "3s", value_parser = parse_duration_flag)]
        grace_period: Duration,
    },
    /// Stream pane activity as newline-delimited events
    Watch {
        session_name: String,
        /// Pane lines per capture
        #[arg(long, default_value_t = 100)]
        lines: u32,
        /// Poll interval
        #[arg(long, default_value = "500ms", value_parser = parse_duration_flag)]
        interval: Duration,
        /// Quiet period before an idle event
        #[arg(long, default_value = "10s", value_parser = parse_duration_flag)]
        idle_threshold: Duration,
        /// Liveness event cadence while nothing changes (0 disables)
        #[arg(long, default_value = "0s", value_parser = parse_duration_flag)]
        heartbeat: Duration,
    },
    /// Inspect and manage queued send jobs
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Show a job's current record
    Status { id: String },
    /// Cancel a queued job (running jobs complete their send)
    Cancel { id: String },
    /// Block until a job reaches a terminal status
    Wait {
        id: String,
        #[arg(long, default_value = "60s", value_parser = parse_duration_flag)]
        timeout: Duration,
    },
}

pub async fn handle(args: AgentArgs, opts: &GlobalOpts) -> i32 {
    let engine = build_engine();
    match args.command {
        AgentCommand::Run {
            workspace,
            assistant,
            name,
            prompt,
            wait,
            wait_timeout,
            idle_threshold,
            idempotency_key,
        } => {
            if let Some(code) = check_replay(opts, &engine, "agent run", &idempotency_key) {
                return code;
            }
            let cancel = cancel_signal(opts.timeout);
            let result = engine
                .run(
                    RunArgs {
                        workspace,
                        assistant,
                        tab_name: name,
                        prompt,
                        wait,
                        wait_timeout,
                        idle_threshold,
                    },
                    cancel,
                )
                .await;
            finish(opts, &engine, "agent run", idempotency_key, result)
        }

        AgentCommand::Send {
            session_name,
            agent,
            text,
            enter,
            r#async,
            wait,
            wait_timeout,
            idle_threshold,
            idempotency_key,
            process_job,
            job_id,
        } => {
            if let Some(code) = check_replay(opts, &engine, "agent send", &idempotency_key) {
                return code;
            }
            let cancel = cancel_signal(opts.timeout);
            let result = engine
                .send(
                    SendArgs {
                        session_name,
                        agent,
                        text,
                        enter,
                        asynchronous: r#async,
                        wait,
                        wait_timeout,
                        idle_threshold,
                        process_job,
                        job_id,
                    },
                    cancel,
                )
                .await;
            finish(opts, &engine, "agent send", idempotency_key, result)
        }

        AgentCommand::Stop {
            session_name,
            grace_period,
        } => {
            let cancel = cancel_signal(opts.timeout);
            let result = engine
                .stop(
                    StopArgs {
                        session_name,
                        grace_period,
                    },
                    cancel,
                )
                .await;
            match result {
                Ok(data) => output::emit_success(opts, data),
                Err(e) => output::emit_engine_error(opts, &e),
            }
        }

        AgentCommand::Watch {
            session_name,
            lines,
            interval,
            idle_threshold,
            heartbeat,
        } => {
            let shutdown = cancel_signal(opts.timeout);
            let json = opts.json;
            let mut stdout = std::io::stdout();
            let mut emit = move |event: &amux_observer::WatchEvent| {
                if json {
                    let line = serde_json::to_string(event)
                        .map_err(|e| std::io::Error::other(e.to_string()))?;
                    writeln!(stdout, "{}", line)?;
                } else {
                    writeln!(stdout, "{}", human_event(event))?;
                }
                stdout.flush()
            };
            let result = engine
                .watch(
                    WatchArgs {
                        session_name,
                        lines,
                        interval,
                        idle_threshold,
                        heartbeat,
                    },
                    shutdown,
                    &mut emit,
                )
                .await;
            match result {
                Ok(()) => amux_core::EXIT_OK,
                Err(e) => output::emit_engine_error(opts, &e),
            }
        }

        AgentCommand::Job { command } => {
            let result = match command {
                JobCommand::Status { id } => engine.job_status(&id),
                JobCommand::Cancel { id } => engine.job_cancel(&id),
                JobCommand::Wait { id, timeout } => engine.job_wait(&id, timeout).await,
            };
            match result {
                Ok(data) => output::emit_success(opts, data),
                Err(e) => output::emit_engine_error(opts, &e),
            }
        }
    }
}

/// Pre-execution idempotency gate: reject keys outside JSON mode, replay
/// hits verbatim. Returns an exit code when the command is already done.
fn check_replay<D: TmuxDriver, C: Clock>(
    opts: &GlobalOpts,
    engine: &Engine<D, C>,
    command: &str,
    key: &Option<String>,
) -> Option<i32> {
    let key = key.as_deref()?;
    if !opts.json {
        return Some(output::emit_error(
            opts,
            ErrorCode::UsageError,
            "--idempotency-key requires --json",
        ));
    }
    match engine.replay(command, key) {
        Err(e) => Some(output::emit_engine_error(opts, &e)),
        Ok(Some((bytes, exit_code))) => Some(output::emit_replayed(&bytes, exit_code)),
        Ok(None) => None,
    }
}

/// Emit the result, persisting it first when an idempotency key is set.
fn finish<D: TmuxDriver, C: Clock>(
    opts: &GlobalOpts,
    engine: &Engine<D, C>,
    command: &str,
    key: Option<String>,
    result: Result<serde_json::Value, amux_engine::EngineError>,
) -> i32 {
    let envelope = output::build_envelope(opts, result);
    match key {
        Some(key) => output::emit_idempotent(opts, engine, command, &key, &envelope),
        None => output::emit_envelope(opts, &envelope),
    }
}

fn human_event(event: &amux_observer::WatchEvent) -> String {
    match event.kind.as_str() {
        "snapshot" => format!(
            "snapshot  {}",
            event.summary.clone().unwrap_or_default()
        ),
        "delta" => format!(
            "delta     {}",
            event.latest_line.clone().unwrap_or_default()
        ),
        "idle" => format!(
            "idle      quiet for {:.1}s",
            event.idle_seconds.unwrap_or_default()
        ),
        "heartbeat" => format!(
            "heartbeat unchanged for {:.1}s",
            event.heartbeat_seconds.unwrap_or_default()
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
