//! Error types for the vellum reconciliation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Structure store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to encode or decode entry record: {0}")]
    Codec(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}

/// Filesystem collaborator errors, classified so callers can tell a missing
/// file apart from a refused or failed operation.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path rejected: {0}")]
    InvalidPath(String),
}

impl FsError {
    /// Classify an `std::io::Error` raised while touching `path`.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_string()),
            _ => FsError::Io {
                path: path.to_string(),
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

/// Known-paths ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Ledger file {0:?} does not exist")]
    Missing(PathBuf),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist ledger to {path:?} after {attempts} attempts: {source}")]
    PersistFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors surfaced to callers of the reconciler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Filesystem error: {0}")]
    FsError(#[from] FsError),

    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scheduler error: {0}")]
    SchedulerError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
