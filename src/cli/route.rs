//! CLI route: single route table and run context. Dispatches to the Reconciler and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_ledger_json, format_ledger_text, format_merge_json, format_merge_text,
    format_pass_json, format_pass_text, format_status_json, format_status_text,
};
use crate::config::{ConfigLoader, VellumConfig};
use crate::document::EntryRecord;
use crate::error::{ApiError, StorageError};
use crate::reconcile::Reconciler;
use crate::tree::path::normalize_entry_path;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: mirror root, loaded config and the reconciler.
pub struct RunContext {
    reconciler: Reconciler,
    root: PathBuf,
    config: VellumConfig,
}

impl RunContext {
    /// Create run context from the mirror root and optional config path. Uses ConfigLoader only.
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        let root = config.workspace_root.clone().unwrap_or(root);
        let reconciler = Reconciler::open(&root, &config)?;
        Ok(Self {
            reconciler,
            root,
            config,
        })
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &VellumConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Scan { format } => {
                let report = self.reconciler.scan()?;
                render(format, || Ok(format_pass_text(&report)), || {
                    format_pass_json(&[&report])
                })
            }
            Commands::Flush { format } => {
                let report = self.reconciler.flush()?;
                render(format, || Ok(format_pass_text(&report)), || {
                    format_pass_json(&[&report])
                })
            }
            Commands::Sync { format } => {
                let (scanned, flushed) = self.reconciler.sync()?;
                render(
                    format,
                    || {
                        Ok(format!(
                            "{}\n{}",
                            format_pass_text(&scanned),
                            format_pass_text(&flushed)
                        ))
                    },
                    || format_pass_json(&[&scanned, &flushed]),
                )
            }
            Commands::Status { format } => {
                let status = self.reconciler.status()?;
                render(format, || Ok(format_status_text(&status)), || {
                    format_status_json(&status)
                })
            }
            Commands::Ledger { format } => {
                let paths = self.reconciler.ledger_paths();
                let degraded = self.reconciler.is_ledger_degraded();
                render(format, || Ok(format_ledger_text(&paths, degraded)), || {
                    format_ledger_json(&paths, degraded)
                })
            }
            Commands::Export { out } => {
                let records = self.reconciler.export()?;
                write_snapshot(out, &records)?;
                Ok(format!(
                    "Exported {} entries to {}",
                    records.len(),
                    out.display()
                ))
            }
            Commands::Merge {
                input,
                no_flush,
                format,
            } => {
                let records = read_snapshot(input)?;
                let outcome = self.reconciler.apply_merge(records)?;
                let flushed = if *no_flush {
                    None
                } else {
                    Some(self.reconciler.flush()?)
                };
                render(
                    format,
                    || Ok(format_merge_text(&outcome, flushed.as_ref())),
                    || format_merge_json(&outcome, flushed.as_ref()),
                )
            }
            Commands::Rm { path } => {
                let path = normalize_entry_path(path)?;
                self.reconciler.delete_file(&path)?;
                Ok(format!(
                    "Tombstoned {}; run `vellum flush` to remove it from disk",
                    path
                ))
            }
        }
    }
}

fn render(
    format: &str,
    text: impl FnOnce() -> Result<String, ApiError>,
    json: impl FnOnce() -> Result<String, ApiError>,
) -> Result<String, ApiError> {
    match format {
        "text" => text(),
        "json" => json(),
        other => Err(ApiError::ConfigError(format!(
            "Invalid output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

fn write_snapshot(path: &Path, records: &[EntryRecord]) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec_pretty(records)
        .map_err(|e| StorageError::Codec(format!("Failed to encode snapshot: {}", e)))?;
    std::fs::write(path, bytes).map_err(StorageError::IoError)?;
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Vec<EntryRecord>, ApiError> {
    let bytes = std::fs::read(path).map_err(StorageError::IoError)?;
    let records = serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::Codec(format!("Invalid snapshot {}: {}", path.display(), e))
    })?;
    Ok(records)
}
