// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelope codec
//!
//! Every JSON response is a single object with a fixed schema version. The
//! encoded bytes (including the trailing newline) are what the idempotency
//! store persists, so encoding must be deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope schema version constant.
pub const SCHEMA_VERSION: &str = "v1";

/// Process exit codes.
pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;
pub const EXIT_INTERNAL_ERROR: i32 = 5;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Usage
    UsageError,
    InvalidAgentId,
    InvalidLines,
    InvalidInterval,
    InvalidIdleThreshold,
    InvalidHeartbeat,
    UnknownAssistant,
    // Lookup
    NotFound,
    SessionLookupFailed,
    SessionExited,
    // Lifecycle
    InitFailed,
    SessionFailed,
    SessionTagFailed,
    PromptSendFailed,
    MetadataSaveFailed,
    StopFailed,
    // Jobs
    JobCreateFailed,
    JobStatusFailed,
    JobStatusConflict,
    JobQueueFailed,
    JobDispatchFailed,
    JobNotFound,
    SendFailed,
    // Idempotency
    IdempotencyFailed,
    // Misc
    EncodeFailed,
    UnknownCommand,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UsageError => "usage_error",
            ErrorCode::InvalidAgentId => "invalid_agent_id",
            ErrorCode::InvalidLines => "invalid_lines",
            ErrorCode::InvalidInterval => "invalid_interval",
            ErrorCode::InvalidIdleThreshold => "invalid_idle_threshold",
            ErrorCode::InvalidHeartbeat => "invalid_heartbeat",
            ErrorCode::UnknownAssistant => "unknown_assistant",
            ErrorCode::NotFound => "not_found",
            ErrorCode::SessionLookupFailed => "session_lookup_failed",
            ErrorCode::SessionExited => "session_exited",
            ErrorCode::InitFailed => "init_failed",
            ErrorCode::SessionFailed => "session_failed",
            ErrorCode::SessionTagFailed => "session_tag_failed",
            ErrorCode::PromptSendFailed => "prompt_send_failed",
            ErrorCode::MetadataSaveFailed => "metadata_save_failed",
            ErrorCode::StopFailed => "stop_failed",
            ErrorCode::JobCreateFailed => "job_create_failed",
            ErrorCode::JobStatusFailed => "job_status_failed",
            ErrorCode::JobStatusConflict => "job_status_conflict",
            ErrorCode::JobQueueFailed => "job_queue_failed",
            ErrorCode::JobDispatchFailed => "job_dispatch_failed",
            ErrorCode::JobNotFound => "job_not_found",
            ErrorCode::SendFailed => "send_failed",
            ErrorCode::IdempotencyFailed => "idempotency_failed",
            ErrorCode::EncodeFailed => "encode_failed",
            ErrorCode::UnknownCommand => "unknown_command",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::UsageError
            | ErrorCode::InvalidAgentId
            | ErrorCode::InvalidLines
            | ErrorCode::InvalidInterval
            | ErrorCode::InvalidIdleThreshold
            | ErrorCode::InvalidHeartbeat
            | ErrorCode::UnknownAssistant => EXIT_USAGE,
            ErrorCode::NotFound | ErrorCode::JobNotFound => EXIT_NOT_FOUND,
            _ => EXIT_INTERNAL_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error payload inside an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A single JSON response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub schema_version: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Envelope {
    pub fn success(version: &str, request_id: Option<String>, data: serde_json::Value) -> Self {
        Self {
            ok: true,
            schema_version: SCHEMA_VERSION.to_string(),
            version: version.to_string(),
            request_id,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(
        version: &str,
        request_id: Option<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            schema_version: SCHEMA_VERSION.to_string(),
            version: version.to_string(),
            request_id,
            data: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                details: None,
            }),
        }
    }

    pub fn failure_with_details(
        version: &str,
        request_id: Option<String>,
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        let mut env = Self::failure(version, request_id, code, message);
        if let Some(err) = env.error.as_mut() {
            err.details = Some(details);
        }
        env
    }

    /// Exit code implied by this envelope.
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            None => EXIT_OK,
            Some(err) => err.code.exit_code(),
        }
    }

    /// Encode as a single JSON line with trailing newline. These bytes are
    /// what the idempotency store replays verbatim.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut s = serde_json::to_string(self)?;
        s.push('\n');
        Ok(s)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
