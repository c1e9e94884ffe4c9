// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope emission and human rendering.
//!
//! JSON mode writes exactly one envelope line to stdout and nothing to
//! stderr. Human mode prints a readable rendering to stdout and error
//! lines to stderr.

use crate::commands::GlobalOpts;
use amux_core::{Clock, Envelope, ErrorCode, EXIT_INTERNAL_ERROR};
use amux_engine::{Engine, EngineError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wrap an operation result in a response envelope.
pub fn build_envelope(
    opts: &GlobalOpts,
    result: Result<serde_json::Value, EngineError>,
) -> Envelope {
    match result {
        Ok(data) => Envelope::success(VERSION, opts.request_id(), data),
        Err(e) => Envelope::failure(VERSION, opts.request_id(), e.code, e.message),
    }
}

/// Persist the envelope for replay, then emit it. A persistence failure is
/// surfaced instead of the original response (fail closed).
pub fn emit_idempotent<D, C: Clock>(
    opts: &GlobalOpts,
    engine: &Engine<D, C>,
    command: &str,
    key: &str,
    envelope: &Envelope,
) -> i32 {
    let bytes = match envelope.encode() {
        Ok(bytes) => bytes,
        Err(e) => return emit_error(opts, ErrorCode::EncodeFailed, &e.to_string()),
    };
    if let Err(e) = engine.persist_response(command, key, envelope.exit_code(), &bytes) {
        return emit_engine_error(opts, &e);
    }
    if opts.json {
        emit_replayed(&bytes, envelope.exit_code())
    } else {
        emit_envelope(opts, envelope)
    }
}

/// Emit a success payload. Returns the process exit code.
pub fn emit_success(opts: &GlobalOpts, data: serde_json::Value) -> i32 {
    let envelope = Envelope::success(VERSION, opts.request_id(), data);
    emit_envelope(opts, &envelope)
}

/// Emit a failure. Returns the process exit code.
pub fn emit_error(opts: &GlobalOpts, code: ErrorCode, message: &str) -> i32 {
    let envelope = Envelope::failure(VERSION, opts.request_id(), code, message);
    emit_envelope(opts, &envelope)
}

/// Emit an engine error. Returns the process exit code.
pub fn emit_engine_error(opts: &GlobalOpts, err: &EngineError) -> i32 {
    emit_error(opts, err.code, &err.message)
}

/// Encode and print an envelope; in human mode, render it readably.
pub fn emit_envelope(opts: &GlobalOpts, envelope: &Envelope) -> i32 {
    if opts.json {
        match envelope.encode() {
            Ok(bytes) => {
                print!("{}", bytes);
                envelope.exit_code()
            }
            Err(e) => {
                // Encoding the fallback cannot fail: it has no data payload
                let fallback = Envelope::failure(
                    VERSION,
                    opts.request_id(),
                    ErrorCode::EncodeFailed,
                    e.to_string(),
                );
                if let Ok(bytes) = fallback.encode() {
                    print!("{}", bytes);
                }
                EXIT_INTERNAL_ERROR
            }
        }
    } else {
        render_human(opts, envelope);
        envelope.exit_code()
    }
}

/// Replay a stored envelope byte-for-byte.
pub fn emit_replayed(bytes: &str, exit_code: i32) -> i32 {
    print!("{}", bytes);
    exit_code
}

/// Whether human output may use ANSI colors. Honors `--no-color` and the
/// conventional NO_COLOR env var.
fn should_colorize(opts: &GlobalOpts) -> bool {
    !opts.no_color && std::env::var_os("NO_COLOR").is_none()
}

fn render_human(opts: &GlobalOpts, envelope: &Envelope) {
    if let Some(ref err) = envelope.error {
        if should_colorize(opts) {
            eprintln!("\x1b[31mError:\x1b[0m {} ({})", err.message, err.code);
        } else {
            eprintln!("Error: {} ({})", err.message, err.code);
        }
        return;
    }
    if opts.quiet {
        return;
    }
    if let Some(ref data) = envelope.data {
        match serde_json::to_string_pretty(data) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", data),
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
