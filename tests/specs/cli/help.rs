//! CLI help surface specs

use crate::prelude::*;

#[test]
fn top_level_help_lists_subcommands() {
    Project::new()
        .amux()
        .args(&["--help"])
        .passes()
        .stdout_has("agent")
        .stdout_has("workspace");
}

#[test]
fn agent_help_lists_verbs() {
    Project::new()
        .amux()
        .args(&["agent", "--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("send")
        .stdout_has("stop")
        .stdout_has("watch")
        .stdout_has("job");
}

#[test]
fn version_flag_prints_version() {
    Project::new()
        .amux()
        .args(&["--version"])
        .passes()
        .stdout_has("amux");
}

#[test]
fn internal_send_flags_stay_hidden() {
    let check = Project::new().amux().args(&["agent", "send", "--help"]).passes();
    assert!(!check.stdout().contains("--process-job"));
    assert!(!check.stdout().contains("--job-id"));
}
