//! Per-session FIFO specs
//!
//! Two send jobs racing on one session must deliver keystrokes in
//! creation order, regardless of which sender starts first.

use crate::prelude::*;
use amux_core::Clock;
use amux_engine::SendArgs;
use std::time::Duration;
use tokio::sync::oneshot;

fn job_args(job_id: &str, text: &str) -> SendArgs {
    SendArgs {
        session_name: None,
        agent: None,
        text: text.to_string(),
        enter: true,
        asynchronous: false,
        wait: false,
        wait_timeout: Duration::from_secs(5),
        idle_threshold: Duration::from_millis(5),
        process_job: true,
        job_id: Some(job_id.to_string()),
    }
}

#[tokio::test]
async fn racing_senders_deliver_in_creation_order() {
    let project = Project::new();
    let engine = project.engine();
    engine.driver.add_session("session-a");

    let now = engine.clock.epoch_secs();
    let first = engine.jobs().create("session-a", None, now).unwrap();
    let second = engine.jobs().create("session-a", None, now).unwrap();

    // Two cooperating control-plane instances over the same store and
    // tmux server, started in reverse order
    let other = project.engine_sharing(&engine);
    let (_t1, c1) = oneshot::channel();
    let (_t2, c2) = oneshot::channel();
    let (r2, r1) = tokio::join!(
        other.send(job_args(&second.id, "second"), c2),
        engine.send(job_args(&first.id, "first"), c1),
    );
    r1.unwrap();
    r2.unwrap();

    assert_eq!(engine.driver.sent_keys(), vec!["first", "second"]);

    // Exactly two deliveries, both jobs completed
    assert_eq!(engine.driver.call_count("send_keys"), 2);
    for id in [&first.id, &second.id] {
        let job = engine.jobs().get(id, engine.clock.epoch_secs()).unwrap();
        assert_eq!(job.status, amux_core::SendJobStatus::Completed);
    }
}

#[tokio::test]
async fn canceled_job_is_skipped_by_the_queue() {
    let project = Project::new();
    let engine = project.engine();
    engine.driver.add_session("session-a");

    let now = engine.clock.epoch_secs();
    let first = engine.jobs().create("session-a", None, now).unwrap();
    let second = engine.jobs().create("session-a", None, now).unwrap();
    engine.jobs().cancel(&first.id, now).unwrap();

    let (_t1, c1) = oneshot::channel();
    let (_t2, c2) = oneshot::channel();
    let (r1, r2) = tokio::join!(
        engine.send(job_args(&first.id, "first"), c1),
        engine.send(job_args(&second.id, "second"), c2),
    );

    let first_data = r1.unwrap();
    assert_eq!(first_data["delivered"], false);
    r2.unwrap();
    assert_eq!(engine.driver.sent_keys(), vec!["second"]);
}
