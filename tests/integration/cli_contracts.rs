use super::support::Workspace;
use clap::Parser;
use docdesk::config::DocdeskConfig;
use docdesk::error::ApiError;
use docdesk::tooling::cli::{Cli, CliContext, Commands};
use std::sync::Arc;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["docdesk", "agents", "create"],
        vec!["docdesk", "agents", "list", "--format", "json"],
        vec!["docdesk", "agents", "status", "Notes"],
        vec!["docdesk", "process"],
        vec!["docdesk", "process", "--agent", "Notes"],
        vec!["docdesk", "chat", "what", "is", "due?"],
        vec!["docdesk", "chat", "--agent", "Notes", "what is due?"],
        vec!["docdesk", "repl", "--agent", "Notes"],
        vec!["docdesk", "serve", "--host", "0.0.0.0", "--port", "9000"],
        vec!["docdesk", "config", "show", "--format", "json"],
        vec!["docdesk", "config", "validate"],
        vec!["docdesk", "--workspace", "/tmp", "--log-level", "debug", "agents", "list"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_invalid_commands() {
    assert!(Cli::try_parse_from(["docdesk", "chat"]).is_err());
    assert!(Cli::try_parse_from(["docdesk", "agents", "status"]).is_err());
    assert!(Cli::try_parse_from(["docdesk", "serve", "--port", "http"]).is_err());
}

fn context(ws: &Workspace) -> CliContext {
    CliContext::with_service(
        ws.documents_dir(),
        DocdeskConfig::default(),
        Arc::new(ws.service()),
    )
}

fn command(args: &[&str]) -> Commands {
    let mut full = vec!["docdesk"];
    full.extend_from_slice(args);
    Cli::try_parse_from(full).unwrap().command
}

#[tokio::test]
async fn agents_list_json_contract() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes.");
    let ctx = context(&ws);

    let output = ctx
        .execute(&command(&["agents", "list", "--format", "json"]))
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let notes = &parsed["Notes"];
    assert_eq!(notes["name"], "Notes");
    assert_eq!(notes["is_initialized"], false);
    assert_eq!(notes["has_persisted_index"], false);
    assert_eq!(notes["turns"], 0);
}

#[tokio::test]
async fn process_then_chat_through_the_cli() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "The essay is due in week five.");
    let ctx = context(&ws);

    let output = ctx
        .execute(&command(&["process", "--format", "json"]))
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["outcomes"]["Notes"]["status"], "built");

    let output = ctx
        .execute(&command(&["chat", "--agent", "Notes", "When", "is", "the", "essay", "due?"]))
        .await
        .unwrap();
    assert!(output.starts_with("[Notes] "));

    let output = ctx
        .execute(&command(&["agents", "status", "Notes"]))
        .await
        .unwrap();
    assert!(output.contains("ready"));
}

#[tokio::test]
async fn unknown_agent_status_is_an_error() {
    let ws = Workspace::new();
    let ctx = context(&ws);
    let result = ctx.execute(&command(&["agents", "status", "Minutes"])).await;
    assert!(matches!(result, Err(ApiError::AgentNotFound { .. })));
}

#[tokio::test]
async fn config_show_masks_the_api_key() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("docdesk.toml");
    std::fs::write(
        &path,
        "[provider]\napi_key = \"sk-test-0123456789abcdef\"\n\n[retrieval]\ntop_k = 4\n",
    )
    .unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), Some(path)).unwrap();

    let output = ctx
        .execute(&command(&["config", "show", "--format", "json"]))
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["provider"]["api_key"], "sk-...cdef");
    assert_eq!(parsed["retrieval"]["top_k"], 4);

    let output = ctx.execute(&command(&["config", "show"])).await.unwrap();
    assert!(output.contains("top_k = 4"));
    assert!(!output.contains("0123456789"));
}
