//! CLI error handling specs
//!
//! Exit codes: 0 success, 2 usage, 3 not found, 5 internal.

use crate::prelude::*;

#[test]
fn unknown_subcommand_is_a_usage_error() {
    Project::new()
        .amux()
        .args(&["frobnicate"])
        .fails_with(2);
}

#[test]
fn idempotency_key_requires_json_mode() {
    Project::new()
        .amux()
        .args(&["agent", "send", "sess-a", "--text", "hi", "--idempotency-key", "K1"])
        .fails_with(2)
        .stderr_has("--idempotency-key requires --json");
}

#[test]
fn json_failures_are_single_line_envelopes() {
    let check = Project::new()
        .amux()
        .args(&["agent", "job", "status", "sj_missing", "--json"])
        .fails_with(3)
        .stderr_empty();
    let envelope = check.envelope();
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["schema_version"], "v1");
    assert_eq!(envelope["error"]["code"], "job_not_found");
}

#[test]
fn unknown_workspace_is_not_found() {
    let check = Project::new()
        .amux()
        .args(&[
            "agent", "run", "--workspace", "ws-missing", "--assistant", "claude", "--json",
        ])
        .fails_with(3)
        .stderr_empty();
    assert_eq!(check.envelope()["error"]["code"], "not_found");
}

#[test]
fn invalid_workspace_id_is_a_usage_error() {
    let check = Project::new()
        .amux()
        .args(&[
            "agent", "run", "--workspace", "bad/id", "--assistant", "claude", "--json",
        ])
        .fails_with(2);
    assert_eq!(check.envelope()["error"]["code"], "usage_error");
}

#[test]
fn wait_without_prompt_is_a_usage_error() {
    let project = Project::new();
    project.seed_workspace("ws-a");
    let check = project
        .amux()
        .args(&[
            "agent", "run", "--workspace", "ws-a", "--assistant", "claude", "--wait", "--json",
        ])
        .fails_with(2);
    assert_eq!(check.envelope()["error"]["code"], "usage_error");
}

#[test]
fn watch_rejects_zero_lines() {
    let check = Project::new()
        .amux()
        .args(&["agent", "watch", "sess-a", "--lines", "0", "--json"])
        .fails_with(2);
    assert_eq!(check.envelope()["error"]["code"], "invalid_lines");
}

#[test]
fn job_cancel_unknown_job_is_not_found() {
    Project::new()
        .amux()
        .args(&["agent", "job", "cancel", "sj_missing"])
        .fails_with(3)
        .stderr_has("not found");
}

#[test]
fn json_errors_never_touch_stderr() {
    Project::new()
        .amux()
        .args(&["agent", "job", "status", "sj_missing", "--json"])
        .fails_with(3)
        .stderr_empty();
}
