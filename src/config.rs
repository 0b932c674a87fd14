//! Configuration System
//!
//! Layered configuration for a mirror root: built-in defaults, the global file,
//! the workspace file and `VELLUM__*` environment overrides, in increasing order
//! of precedence.

use crate::error::ApiError;
use crate::ledger::SavePolicy;
use crate::logging::LoggingConfig;
use crate::tree::walker::default_ignore_patterns;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod paths;
mod sources;
mod workspace;

pub use facade::ConfigLoader;
pub use workspace::{StorageConfig, StoragePaths};

/// Re-export of XDG path helpers
pub mod xdg {
    pub use super::paths::xdg_root::*;
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VellumConfig {
    /// Mirror root (defaults to the root given on the command line)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// System-wide settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Reconciliation tuning
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// System-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Replica name stamped on document writes; generated and stored in the
    /// document database when unset
    #[serde(default)]
    pub replica_id: Option<String>,

    /// Attempts per ledger save before entering degraded mode
    #[serde(default = "default_ledger_save_retries")]
    pub ledger_save_retries: u32,

    /// Linear backoff between ledger save attempts
    #[serde(default = "default_ledger_retry_backoff_ms")]
    pub ledger_retry_backoff_ms: u64,

    /// Periodic flush interval for the scheduler; 0 disables it
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// File or directory names skipped when listing the mirror
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_ledger_save_retries() -> u32 {
    3
}

fn default_ledger_retry_backoff_ms() -> u64 {
    25
}

fn default_flush_interval_ms() -> u64 {
    30_000
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            replica_id: None,
            ledger_save_retries: default_ledger_save_retries(),
            ledger_retry_backoff_ms: default_ledger_retry_backoff_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl ReconcileConfig {
    pub fn save_policy(&self) -> SavePolicy {
        SavePolicy {
            attempts: self.ledger_save_retries,
            backoff: Duration::from_millis(self.ledger_retry_backoff_ms),
        }
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        (self.flush_interval_ms > 0).then(|| Duration::from_millis(self.flush_interval_ms))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ledger_save_retries == 0 {
            return Err("ledger_save_retries must be at least 1".to_string());
        }
        if let Some(replica) = &self.replica_id {
            if replica.trim().is_empty() {
                return Err("replica_id cannot be blank".to_string());
            }
        }
        if self.ignore_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err("ignore_patterns cannot contain blank entries".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Storage(String),
    Reconcile(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Reconcile(msg) => write!(f, "Reconcile: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl VellumConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.system.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.reconcile.validate() {
            errors.push(ValidationError::Reconcile(e));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one `ApiError`
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }
}
