//! Watch stream specs against the fake tmux server.

use crate::prelude::*;
use amux_engine::WatchArgs;
use amux_observer::WatchEvent;
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test]
async fn constant_pane_emits_heartbeats_then_exited() {
    let project = Project::new();
    let engine = project.engine();
    engine.driver.add_session("s");
    engine.driver.set_pane("s", "steady output");

    let args = WatchArgs {
        session_name: "s".to_string(),
        lines: 50,
        interval: Duration::from_millis(1),
        idle_threshold: Duration::from_secs(3600),
        heartbeat: Duration::from_millis(2),
    };

    let (_tx, shutdown) = oneshot::channel();
    let mut events: Vec<WatchEvent> = Vec::new();
    let mut sink = |e: &WatchEvent| -> std::io::Result<()> {
        events.push(e.clone());
        Ok(())
    };
    let watch_fut = engine.watch(args, shutdown, &mut sink);
    let steer = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        engine.driver.remove_session("s");
    };
    let (result, ()) = tokio::join!(watch_fut, steer);
    result.unwrap();

    let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds.iter().filter(|k| **k == "snapshot").count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == "delta").count(), 0);
    assert!(kinds.contains(&"heartbeat"));
    assert_eq!(kinds.last(), Some(&"exited"));

    let beat = events.iter().find(|e| e.kind == "heartbeat").unwrap();
    assert!(beat.heartbeat_seconds.unwrap() > 0.0);

    // Events carry RFC3339 timestamps
    assert!(events[0].ts.contains('T'));
}

#[tokio::test]
async fn every_event_serializes_to_one_json_line() {
    let project = Project::new();
    let engine = project.engine();
    engine.driver.add_session("s");
    engine.driver.set_pane("s", "hello");
    engine.driver.push_frame("s", "hello\nmore");

    let args = WatchArgs {
        session_name: "s".to_string(),
        lines: 50,
        interval: Duration::from_millis(1),
        idle_threshold: Duration::from_millis(3),
        heartbeat: Duration::ZERO,
    };

    let (_tx, shutdown) = oneshot::channel();
    let mut lines: Vec<String> = Vec::new();
    let mut sink = |e: &WatchEvent| -> std::io::Result<()> {
        lines.push(serde_json::to_string(e).map_err(std::io::Error::other)?);
        Ok(())
    };
    let watch_fut = engine.watch(args, shutdown, &mut sink);
    let steer = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        engine.driver.remove_session("s");
    };
    let (result, ()) = tokio::join!(watch_fut, steer);
    result.unwrap();

    for line in &lines {
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.get("type").is_some());
        assert!(value.get("ts").is_some());
    }
    let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["type"], "snapshot");
}
