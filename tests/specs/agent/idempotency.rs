//! Idempotent replay specs
//!
//! A replayed invocation must emit byte-identical output and touch the
//! tmux server zero additional times.

use crate::prelude::*;
use amux_core::Envelope;
use amux_engine::SendArgs;
use std::time::Duration;
use tokio::sync::oneshot;

fn send_args() -> SendArgs {
    SendArgs {
        session_name: Some("session-a".to_string()),
        agent: None,
        text: "hello".to_string(),
        enter: true,
        asynchronous: false,
        wait: false,
        wait_timeout: Duration::from_secs(5),
        idle_threshold: Duration::from_millis(5),
        process_job: false,
        job_id: None,
    }
}

#[tokio::test]
async fn replay_is_byte_identical_with_zero_driver_calls() {
    let project = Project::new();
    let engine = project.engine();
    engine.driver.add_session("session-a");

    // First invocation: execute, wrap, persist
    let (_tx, cancel) = oneshot::channel();
    let data = engine.send(send_args(), cancel).await.unwrap();
    let envelope = Envelope::success("spec", Some("req-1".to_string()), data);
    let bytes = envelope.encode().unwrap();
    engine
        .persist_response("agent send", "K1", envelope.exit_code(), &bytes)
        .unwrap();

    let state_calls = engine.driver.call_count("session_state");
    let send_calls = engine.driver.call_count("send_keys");

    // Second identical invocation: replay short-circuits everything
    let (replayed, exit_code) = engine.replay("agent send", "K1").unwrap().unwrap();

    assert_eq!(replayed, bytes);
    assert_eq!(exit_code, 0);
    assert_eq!(engine.driver.call_count("session_state"), state_calls);
    assert_eq!(engine.driver.call_count("send_keys"), send_calls);
}

#[tokio::test]
async fn replay_preserves_failure_envelopes() {
    let project = Project::new();
    let engine = project.engine();

    // No session: the send fails with not_found (exit 3)
    let (_tx, cancel) = oneshot::channel();
    let err = engine.send(send_args(), cancel).await.unwrap_err();
    let envelope = Envelope::failure("spec", Some("req-1".to_string()), err.code, err.message);
    let bytes = envelope.encode().unwrap();
    engine
        .persist_response("agent send", "K2", envelope.exit_code(), &bytes)
        .unwrap();

    let (replayed, exit_code) = engine.replay("agent send", "K2").unwrap().unwrap();
    assert_eq!(replayed, bytes);
    assert_eq!(exit_code, 3);
}

#[tokio::test]
async fn keys_are_scoped_per_command() {
    let project = Project::new();
    let engine = project.engine();
    engine
        .persist_response("agent send", "K1", 0, "{\"ok\":true}\n")
        .unwrap();

    assert!(engine.replay("agent run", "K1").unwrap().is_none());
}
