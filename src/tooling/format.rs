//! Text and JSON rendering for CLI output.

use crate::agent::{AgentStatus, ReconcileReport};
use crate::error::ApiError;
use crate::index::BuildOutcome;
use crate::provider::ValidationResult;
use crate::service::{ProcessOutcome, ProcessReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))
}

pub fn format_agent_list_text(statuses: &BTreeMap<String, AgentStatus>) -> String {
    if statuses.is_empty() {
        return "No agents found.\n\nAdd documents to the documents directory and run `docdesk agents create`."
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "State", "Turns", "Document"]);
    for status in statuses.values() {
        table.add_row(vec![
            status.name.clone(),
            status.state_label().to_string(),
            status.turns.to_string(),
            status.source_path.clone(),
        ]);
    }
    format!(
        "{}\n\n{}\n\nTotal: {} agent(s)",
        format_section_heading("Agents"),
        table,
        statuses.len()
    )
}

pub fn format_agent_status_text(status: &AgentStatus) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&format!("Agent: {}", status.name)));
    out.push_str(&format!("  Document:        {}\n", status.source_path));
    out.push_str(&format!("  State:           {}\n", status.state_label()));
    out.push_str(&format!("  Index in memory: {}\n", yes_no(status.is_initialized)));
    out.push_str(&format!("  Index on disk:   {}\n", yes_no(status.has_persisted_index)));
    out.push_str(&format!("  Index location:  {}\n", status.index_location));
    out.push_str(&format!("  Turns:           {}", status.turns));
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn name_list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

pub fn format_reconcile_text(report: &ReconcileReport) -> String {
    let mut out = format!("Created {} agents\n", report.agent_count);
    out.push_str(&format!("  New:      {}\n", name_list(&report.created)));
    out.push_str(&format!("  Restored: {}\n", name_list(&report.restored)));
    out.push_str(&format!("  Retired:  {}\n", name_list(&report.retired)));
    if !report.issues.is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Issues")));
        for issue in &report.issues {
            out.push_str(&format!("  {} {}\n", "!".yellow(), issue));
        }
    }
    out.trim_end().to_string()
}

fn outcome_cells(outcome: &ProcessOutcome) -> (String, String) {
    match outcome {
        ProcessOutcome::Loaded => ("loaded".to_string(), "existing index".to_string()),
        ProcessOutcome::Built { chunks } => ("built".to_string(), format!("{} chunks", chunks)),
        ProcessOutcome::Failed { reason } => ("failed".to_string(), reason.clone()),
    }
}

pub fn format_process_text(report: &ProcessReport) -> String {
    if report.outcomes.is_empty() {
        return "No agents to process.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Result", "Detail"]);
    for (name, outcome) in &report.outcomes {
        let (result, detail) = outcome_cells(outcome);
        table.add_row(vec![name.clone(), result, detail]);
    }
    let mut out = format!("{}\n\n{}\n", format_section_heading("Processing"), table);
    let failed = report.failed();
    if failed == 0 {
        out.push_str("\nAll documents processed successfully");
    } else {
        out.push_str(&format!(
            "\n{} of {} documents failed",
            failed.red(),
            report.outcomes.len()
        ));
    }
    out
}

pub fn format_build_outcome_text(agent: &str, outcome: &BuildOutcome) -> String {
    match outcome {
        BuildOutcome::Loaded => format!("Document processed for agent '{}' (existing index loaded)", agent),
        BuildOutcome::Built { chunks } => format!(
            "Document processed for agent '{}' ({} chunks indexed)",
            agent, chunks
        ),
    }
}

pub fn format_provider_validation_text(result: &ValidationResult, api_key: &str) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Provider: {}", result.provider_type))
    );
    out.push_str(&format!("  API key: {}\n\n", api_key));
    for (description, passed) in &result.checks {
        let mark = if *passed { "ok" } else { "--" };
        out.push_str(&format!("  [{}] {}\n", mark, description));
    }
    for error in &result.errors {
        out.push_str(&format!("  {} {}\n", "error:".red(), error));
    }
    for warning in &result.warnings {
        out.push_str(&format!("  {} {}\n", "warning:".yellow(), warning));
    }
    out.push_str(&format!(
        "\n{}/{} checks passed",
        result.passed_checks(),
        result.checks.len()
    ));
    out
}
