// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    box_top = { "╭──────────────╮", true },
    box_side = { "│ some framed text │", true },
    box_bottom = { "╰──────────────╯", true },
    spinner = { "✻ Cogitating… (3s)", true },
    braille_spinner = { "⠋ working", true },
    banner = { "▛▀▀▀▜ Claude", true },
    ran_line = { "Ran `cargo test`", true },
    interacted = { "Interacted with the browser", true },
    telemetry = { "✗ Auto-update failed · restart to retry", true },
    prompt = { "› fix the bug", true },
    alt_prompt = { "❯ 1. Yes, proceed", true },
    prose = { "The fix is to reorder the checks.", false },
    bullet = { "- first point", false },
    numbered = { "1. do the thing", false },
    code_fence = { "```rust", false },
    blank = { "", false },
)]
fn chrome_lines(line: &str, expected: bool) {
    assert_eq!(is_chrome_line(line), expected);
}

#[test]
fn compact_drops_chrome_and_keeps_content() {
    let pane = "\
╭──────────────╮
│  Assistant   │
╰──────────────╯
Here is the plan:
- step one
- step two
✻ Thinking… (2s · esc to interrupt)
Done.";
    let compacted = compact_agent_output(pane);
    assert_eq!(
        compacted,
        "Here is the plan:\n- step one\n- step two\nDone."
    );
}

#[test]
fn compact_drops_prompt_echo_continuations() {
    let pane = "\
reply text
› please fix the bug in the parser
  and also add a regression test
next line";
    assert_eq!(compact_agent_output(pane), "reply text\nnext line");
}

#[test]
fn compact_preserves_paragraph_breaks() {
    let pane = "first paragraph\n\nsecond paragraph";
    assert_eq!(compact_agent_output(pane), pane);
}

#[test]
fn compact_trims_blank_edges() {
    let pane = "\n\ncontent line\n\n";
    assert_eq!(compact_agent_output(pane), "content line");
}

#[parameterized(
    thinking_spinner = { "Thinking ✻", true },
    thinking_ellipsis = { "thinking…", true },
    working_line = { "Working (12s • esc to interrupt)", true },
    bare_interrupt = { "(esc to interrupt)", true },
    thinking_prose = { "Thinking about your question is hard", false },
    content = { "agent reply", false },
    empty = { "", false },
)]
fn progress_noise(line: &str, expected: bool) {
    assert_eq!(is_progress_noise(line), expected);
}

#[test]
fn interrupt_hint_with_needs_input_marker_is_not_noise() {
    // The explicit marker outranks the noise rule
    let line = "Do you want to continue? (y/n) (esc to interrupt)";
    assert!(!is_progress_noise(line));
}

#[parameterized(
    yn = { "Do you want me to proceed? (y/N)" },
    brackets = { "Continue? [y/n]" },
    yes_no = { "Overwrite the file? (yes/no)" },
    press_enter = { "Press Enter to continue" },
    press_any_key = { "press any key to continue" },
    would_you = { "Would you like me to keep going" },
    should_i = { "Should I apply the patch now" },
    which_option = { "Which option should be used" },
    select = { "Select an option:" },
    approval = { "This command needs your approval" },
    permission = { "Permission required to write outside the workspace" },
)]
fn explicit_needs_input_detected(content: &str) {
    assert!(detect_needs_input(content).is_some());
}

#[parameterized(
    plain_reply = { "I finished refactoring the module." },
    question_without_marker = { "The tests are green, anything else?" },
    empty = { "" },
)]
fn explicit_needs_input_not_detected(content: &str) {
    assert!(detect_needs_input(content).is_none());
}

#[test]
fn needs_input_is_case_insensitive() {
    assert!(detect_needs_input("DO YOU WANT to continue?").is_some());
}

#[test]
fn needs_input_hint_is_the_matching_line() {
    let pane = "some output\nDo you want me to proceed? (y/N)\n";
    assert_eq!(
        detect_needs_input(pane).unwrap(),
        "Do you want me to proceed? (y/N)"
    );
}

#[test]
fn bypass_permissions_hint_is_normalized() {
    let pane = "╭─╮\nBypass Permissions On\n1. Yes  2. No";
    assert_eq!(detect_needs_input(pane).unwrap(), PERMISSION_MODE_HINT);
}

#[test]
fn latest_marker_line_wins() {
    let pane = "Press enter to continue\nmore output\nDo you want a summary? (y/n)";
    assert_eq!(
        detect_needs_input(pane).unwrap(),
        "Do you want a summary? (y/n)"
    );
}

#[parameterized(
    do_you = { "Do you want the long version?", true },
    should_i = { "Should I split this into two PRs?", true },
    no_question_mark = { "Do you want the long version", false },
    unknown_starter = { "Ship it?", false },
)]
fn question_fallback(content: &str, expected: bool) {
    assert_eq!(detect_question(content).is_some(), expected);
}
