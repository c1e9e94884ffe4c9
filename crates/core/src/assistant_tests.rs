// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builtin_table_has_stock_assistants() {
    let table = AssistantTable::builtin();
    assert_eq!(table.command("claude"), Some("claude"));
    assert_eq!(table.command("codex"), Some("codex"));
    assert_eq!(table.command("aider"), None);
}

#[test]
fn toml_overrides_and_extends() {
    let table = AssistantTable::from_toml(
        "[assistants]\nclaude = \"claude --permission-mode plan\"\naider = \"aider\"\n",
    );
    assert_eq!(table.command("claude"), Some("claude --permission-mode plan"));
    assert_eq!(table.command("aider"), Some("aider"));
    // Untouched built-ins survive
    assert_eq!(table.command("codex"), Some("codex"));
}

#[test]
fn malformed_toml_falls_back_to_builtins() {
    let table = AssistantTable::from_toml("not valid toml {{{");
    assert_eq!(table.command("claude"), Some("claude"));
}

#[test]
fn empty_document_keeps_builtins() {
    let table = AssistantTable::from_toml("");
    assert!(table.names().count() >= 2);
}
