//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, LedgerError, StorageError};

/// Map domain errors to a one-line message for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(StorageError::EntryNotFound(path)) => {
            format!("No entry for '{}' in the document", path)
        }
        ApiError::LedgerError(LedgerError::PersistFailed { path, .. }) => format!(
            "Known-paths ledger at {} cannot be written; deletions may be undone until it can",
            path.display()
        ),
        other => other.to_string(),
    }
}
