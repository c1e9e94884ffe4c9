//! End-to-end `agent run` specs against the fake tmux server.

use crate::prelude::*;
use amux_core::ErrorCode;
use amux_engine::RunArgs;
use std::time::Duration;
use tokio::sync::oneshot;

fn run_args() -> RunArgs {
    RunArgs {
        workspace: "ws-a".to_string(),
        assistant: "claude".to_string(),
        tab_name: None,
        prompt: Some("hi".to_string()),
        wait: true,
        wait_timeout: Duration::from_secs(5),
        idle_threshold: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn run_with_wait_reports_the_reply() {
    let project = Project::new();
    project.seed_workspace("ws-a");
    let engine = project.engine();
    engine.driver.set_default_pane("before");

    let (_tx, cancel) = oneshot::channel();
    let run_fut = engine.run(run_args(), cancel);
    let steer = async {
        loop {
            if !engine.driver.sent_keys().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let session = engine.driver.started_session_name().unwrap();
        engine.driver.push_frame(&session, "before\nagent reply");
    };
    let (result, ()) = tokio::join!(run_fut, steer);
    let data = result.unwrap();

    assert_eq!(data["response"]["status"], "idle");
    assert_eq!(data["response"]["delta"], "agent reply");
    assert_eq!(data["response"]["latest_line"], "agent reply");

    // The tab landed in the workspace record
    let ws = engine.workspaces().load("ws-a").unwrap().unwrap();
    assert_eq!(ws.tabs.len(), 1);
}

#[tokio::test]
async fn run_with_wait_surfaces_confirmation_prompts() {
    let project = Project::new();
    project.seed_workspace("ws-a");
    let engine = project.engine();
    engine.driver.set_default_pane("before");

    let mut args = run_args();
    args.idle_threshold = Duration::from_secs(3600);
    let (_tx, cancel) = oneshot::channel();
    let run_fut = engine.run(args, cancel);
    let steer = async {
        loop {
            if !engine.driver.sent_keys().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let session = engine.driver.started_session_name().unwrap();
        engine
            .driver
            .push_frame(&session, "before\nDo you want me to proceed? (y/N)");
    };
    let (result, ()) = tokio::join!(run_fut, steer);
    let data = result.unwrap();

    assert_eq!(data["response"]["status"], "needs_input");
    assert_eq!(
        data["response"]["input_hint"],
        "Do you want me to proceed? (y/N)"
    );
    assert_eq!(
        data["response"]["summary"],
        "Needs input: Do you want me to proceed? (y/N)"
    );
}

#[tokio::test]
async fn failed_startup_verification_leaves_nothing_behind() {
    let project = Project::new();
    project.seed_workspace("ws-a");
    let engine = project.engine();
    engine.driver.fail_times("session_state", 1);

    let (_tx, cancel) = oneshot::channel();
    let err = engine.run(run_args(), cancel).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::SessionLookupFailed);
    assert_eq!(engine.driver.call_count("kill_session"), 1);
    let ws = engine.workspaces().load("ws-a").unwrap().unwrap();
    assert!(ws.tabs.is_empty());
}
