// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use amux_adapters::FakeTmuxDriver;
use amux_core::SystemClock;
use std::time::Duration;
use tokio::time::timeout;

fn params() -> WaitParams {
    WaitParams {
        capture_lines: 100,
        poll_interval: Duration::from_millis(1),
        idle_threshold: Duration::from_millis(5),
        wait_timeout: Duration::from_secs(5),
    }
}

async fn run_wait(
    driver: &FakeTmuxDriver,
    wait_params: &WaitParams,
    baseline: &WaitBaseline,
) -> WaitOutcome {
    let (_tx, cancel) = tokio::sync::oneshot::channel::<()>();
    let clock = SystemClock;
    match timeout(
        Duration::from_secs(10),
        wait_for_response(driver, &clock, "s", wait_params, baseline, cancel),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => panic!("wait loop did not terminate"),
    }
}

#[tokio::test]
async fn idle_after_substantive_change() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");
    driver.push_frame("s", "before\nagent reply");

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &params(), &baseline).await;

    assert_eq!(outcome.status, WaitStatus::Idle);
    assert_eq!(outcome.delta, "agent reply");
    assert_eq!(outcome.latest_line, "agent reply");
    assert!(outcome.changed);
    assert!(!outcome.timed_out);
    assert!(!outcome.session_exited);
    assert!(outcome.idle_seconds > 0.0);
}

#[tokio::test]
async fn needs_input_short_circuits_idle_stabilization() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");
    driver.push_frame("s", "before\nDo you want me to proceed? (y/N)");

    let mut p = params();
    // Idle stabilization would take an hour; needs-input must win first
    p.idle_threshold = Duration::from_secs(3600);

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &p, &baseline).await;

    assert_eq!(outcome.status, WaitStatus::NeedsInput);
    assert!(outcome.needs_input);
    assert_eq!(
        outcome.input_hint.as_deref(),
        Some("Do you want me to proceed? (y/N)")
    );
    assert_eq!(
        outcome.summary,
        "Needs input: Do you want me to proceed? (y/N)"
    );
}

#[tokio::test]
async fn unchanged_pane_times_out() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");

    let mut p = params();
    p.wait_timeout = Duration::from_millis(10);

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &p, &baseline).await;

    assert_eq!(outcome.status, WaitStatus::TimedOut);
    assert!(outcome.timed_out);
    assert!(!outcome.changed);
    assert_eq!(outcome.content, "before");
    assert_eq!(outcome.delta, "");
}

#[tokio::test]
async fn vanished_session_reports_session_exited() {
    let driver = FakeTmuxDriver::new();
    // Session never registered: captures fail, state probes report missing

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &params(), &baseline).await;

    assert_eq!(outcome.status, WaitStatus::SessionExited);
    assert!(outcome.session_exited);
    assert_eq!(outcome.summary, "Session exited");
    // Nothing was ever captured: fall back to the baseline
    assert_eq!(outcome.content, "before");
}

#[tokio::test]
async fn partial_output_is_preserved_when_session_dies() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");
    driver.push_frame("s", "before\npartial reply");

    let mut p = params();
    p.idle_threshold = Duration::from_secs(3600);

    let baseline = WaitBaseline::capture("before".to_string());
    let (_tx, cancel) = tokio::sync::oneshot::channel::<()>();
    let clock = SystemClock;
    let wait_fut = wait_for_response(&driver, &clock, "s", &p, &baseline, cancel);
    let steer = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        driver.remove_session("s");
    };
    let (outcome, ()) = match timeout(Duration::from_secs(10), async {
        tokio::join!(wait_fut, steer)
    })
    .await
    {
        Ok(pair) => pair,
        Err(_) => panic!("wait loop did not terminate"),
    };

    assert_eq!(outcome.status, WaitStatus::SessionExited);
    assert!(outcome.changed);
    assert!(outcome.content.contains("partial reply"));
    assert_eq!(outcome.delta, "partial reply");
}

#[tokio::test]
async fn cancellation_reports_timed_out() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");

    let mut p = params();
    p.wait_timeout = Duration::from_secs(3600);

    let baseline = WaitBaseline::capture("before".to_string());
    let (tx, cancel) = tokio::sync::oneshot::channel::<()>();
    let clock = SystemClock;
    let wait_fut = wait_for_response(&driver, &clock, "s", &p, &baseline, cancel);
    let steer = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let _ = tx.send(());
    };
    let (outcome, ()) = timeout(Duration::from_secs(10), async {
        tokio::join!(wait_fut, steer)
    })
    .await
    .unwrap();

    assert_eq!(outcome.status, WaitStatus::TimedOut);
    assert!(outcome.timed_out);
}

#[tokio::test]
async fn progress_noise_alone_never_counts_as_change() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");
    driver.push_frame("s", "before\n✻ Thinking… (2s · esc to interrupt)");

    let mut p = params();
    p.wait_timeout = Duration::from_millis(20);

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &p, &baseline).await;

    // Spinner churn changed the raw pane but not the stable content
    assert_eq!(outcome.status, WaitStatus::TimedOut);
    assert!(!outcome.changed);
}

#[tokio::test]
async fn transient_capture_misses_recover() {
    let driver = FakeTmuxDriver::new();
    driver.add_session("s");
    driver.set_pane("s", "before");
    driver.push_frame("s", "before\nagent reply");
    driver.fail_times("capture_pane_tail", 2);

    let baseline = WaitBaseline::capture("before".to_string());
    let outcome = run_wait(&driver, &params(), &baseline).await;

    assert_eq!(outcome.status, WaitStatus::Idle);
    assert_eq!(outcome.delta, "agent reply");
}
