//! CLI presentation: text and json formatters per command.

use crate::error::ApiError;
use crate::reconcile::{MergeOutcome, PassReport, PathOutcome, Resolution, StatusReport};
use serde::Serialize;
use serde_json::json;

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}

fn outcome_label(outcome: &PathOutcome) -> String {
    match outcome {
        PathOutcome::Imported => "imported".to_string(),
        PathOutcome::Written => "written".to_string(),
        PathOutcome::Deleted => "deleted".to_string(),
        PathOutcome::Resurrected => "resurrected".to_string(),
        PathOutcome::Unchanged => "unchanged".to_string(),
        PathOutcome::Failed { reason } => format!("failed: {}", reason),
    }
}

/// Changed and failed paths, then a one-line summary. Unchanged paths are omitted.
pub fn format_pass_text(report: &PassReport) -> String {
    let mut lines = Vec::new();
    for (path, outcome) in &report.outcomes {
        if *outcome != PathOutcome::Unchanged {
            lines.push(format!("  {:<12} {}", outcome_label(outcome), path));
        }
    }

    let s = report.summary();
    let mut summary = format!(
        "{}: {} imported, {} written, {} deleted, {} resurrected, {} unchanged, {} failed",
        report.kind, s.imported, s.written, s.deleted, s.resurrected, s.unchanged, s.failed
    );
    if report.ledger_degraded {
        summary.push_str("\nwarning: known-paths ledger is degraded; tombstoned files on disk are treated as new");
    }
    lines.push(summary);
    lines.join("\n")
}

pub fn format_pass_json(reports: &[&PassReport]) -> Result<String, ApiError> {
    let passes: Vec<_> = reports
        .iter()
        .map(|report| {
            json!({
                "kind": report.kind,
                "summary": report.summary(),
                "ledger_degraded": report.ledger_degraded,
                "outcomes": report.outcomes,
            })
        })
        .collect();
    to_json(&json!({ "passes": passes }))
}

pub fn format_status_text(status: &StatusReport) -> String {
    let mut out = format!(
        "Replica:     {}\nTracked:     {}\nTombstoned:  {}\nLedger:      {} paths ({})",
        status.replica,
        status.tracked,
        status.tombstoned,
        status.ledger_entries,
        status.ledger_file.display()
    );
    if status.ledger_degraded {
        out.push_str("\nLedger state: degraded");
    }
    if let Some(warning) = &status.ledger_warning {
        out.push_str(&format!("\nLedger load warning: {}", warning));
    }
    out
}

pub fn format_status_json(status: &StatusReport) -> Result<String, ApiError> {
    to_json(status)
}

pub fn format_ledger_text(paths: &[String], degraded: bool) -> String {
    let mut out = if paths.is_empty() {
        "Ledger is empty".to_string()
    } else {
        paths.join("\n")
    };
    if degraded {
        out.push_str("\n(degraded: entries are not being honored)");
    }
    out
}

pub fn format_ledger_json(paths: &[String], degraded: bool) -> Result<String, ApiError> {
    to_json(&json!({ "paths": paths, "degraded": degraded }))
}

pub fn format_merge_text(outcome: &MergeOutcome, flushed: Option<&PassReport>) -> String {
    let mut lines = vec![format!(
        "merge: {} changed, {} rejected",
        outcome.changed.len(),
        outcome.rejected.len()
    )];
    for (path, resolution) in &outcome.resolutions {
        match resolution {
            Resolution::ContentWins => lines.push(format!("  content wins  {}", path)),
            Resolution::DeletionWins => lines.push(format!("  deletion wins {}", path)),
            Resolution::Live => {}
        }
    }
    for path in &outcome.rejected {
        lines.push(format!("  rejected      {}", path));
    }
    if let Some(report) = flushed {
        lines.push(format_pass_text(report));
    }
    lines.join("\n")
}

pub fn format_merge_json(
    outcome: &MergeOutcome,
    flushed: Option<&PassReport>,
) -> Result<String, ApiError> {
    to_json(&json!({ "merge": outcome, "flush": flushed }))
}
