//! Workspace management specs

use crate::prelude::*;

#[test]
fn add_then_list_round_trips() {
    let project = Project::new();
    project
        .amux()
        .args(&["workspace", "add", "ws-a", "--root", "/tmp", "--json"])
        .passes()
        .stderr_empty();

    let check = project
        .amux()
        .args(&["workspace", "list", "--json"])
        .passes();
    let envelope = check.envelope();
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["data"]["workspaces"][0]["id"], "ws-a");
    assert_eq!(
        envelope["data"]["workspaces"][0]["default_assistant"],
        "claude"
    );
}

#[test]
fn add_rejects_missing_root() {
    Project::new()
        .amux()
        .args(&[
            "workspace",
            "add",
            "ws-a",
            "--root",
            "/nonexistent/path/xyz",
        ])
        .fails_with(2)
        .stderr_has("invalid --root");
}

#[test]
fn list_is_empty_on_a_fresh_home() {
    let check = Project::new()
        .amux()
        .args(&["workspace", "list", "--json"])
        .passes();
    assert_eq!(
        check.envelope()["data"]["workspaces"]
            .as_array()
            .unwrap()
            .len(),
        0
    );
}
