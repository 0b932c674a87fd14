//! StorageConfig and resolve_paths for the document database and the ledger.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const DEFAULT_DOCUMENT_PATH: &str = ".vellum/document";
const DEFAULT_LEDGER_PATH: &str = ".vellum/known_paths.json";

fn default_document_path() -> PathBuf {
    PathBuf::from(DEFAULT_DOCUMENT_PATH)
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(DEFAULT_LEDGER_PATH)
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Document database directory (absolute, or relative to the root's data dir)
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// Known-paths ledger file (absolute, or relative to the root's data dir)
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

/// Resolved on-disk locations for one mirror root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub document: PathBuf,
    pub ledger: PathBuf,
}

impl StorageConfig {
    /// Resolve storage paths to actual filesystem locations.
    ///
    /// Absolute paths are used as given. Relative ones resolve under the XDG
    /// data directory for the root, never inside the mirror, so the walker
    /// cannot import the store's own files.
    pub fn resolve_paths(&self, workspace_root: &Path) -> Result<StoragePaths, ApiError> {
        let document = resolve_one(
            workspace_root,
            &self.document_path,
            DEFAULT_DOCUMENT_PATH,
            "document",
        )?;
        let ledger = resolve_one(
            workspace_root,
            &self.ledger_path,
            DEFAULT_LEDGER_PATH,
            "known_paths.json",
        )?;
        Ok(StoragePaths { document, ledger })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.document_path.as_os_str().is_empty() {
            return Err("document_path cannot be empty".to_string());
        }
        if self.ledger_path.as_os_str().is_empty() {
            return Err("ledger_path cannot be empty".to_string());
        }
        for (name, path) in [
            ("document_path", &self.document_path),
            ("ledger_path", &self.ledger_path),
        ] {
            if path.components().any(|c| c == Component::ParentDir) {
                return Err(format!("{} cannot contain '..': {:?}", name, path));
            }
        }
        Ok(())
    }
}

fn resolve_one(
    workspace_root: &Path,
    configured: &Path,
    default: &str,
    default_name: &str,
) -> Result<PathBuf, ApiError> {
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    let data_dir = xdg::workspace_data_dir(workspace_root)?;
    if configured == Path::new(default) {
        Ok(data_dir.join(default_name))
    } else {
        Ok(data_dir.join(configured))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
            ledger_path: default_ledger_path(),
        }
    }
}
