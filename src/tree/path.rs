//! Path canonicalization and normalization utilities
//!
//! Entry paths in the document are relative, `/`-separated and NFC-normalized so
//! replicas on different platforms agree on the key for the same file.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a mirror root (resolves symlinks, `..`, `.`) and normalize it to NFC
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, StorageError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        StorageError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e))
    })?;
    let normalized: String = canonical.to_string_lossy().nfc().collect();
    Ok(PathBuf::from(normalized))
}

/// Normalize an entry path string to its document key form.
///
/// Rejects empty paths, absolute paths and any `..` component, since entries
/// arrive from peers and must never address files outside the mirror root.
pub fn normalize_entry_path(path: &str) -> Result<String, StorageError> {
    let unified: String = path.replace('\\', "/").nfc().collect();

    let bytes = unified.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if unified.starts_with('/') || has_drive {
        return Err(StorageError::InvalidPath(format!(
            "Entry path must be relative: {}",
            path
        )));
    }

    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "Entry path escapes the root: {}",
                    path
                )))
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Err(StorageError::InvalidPath(format!(
            "Entry path is empty: {:?}",
            path
        )));
    }

    Ok(parts.join("/"))
}

/// Convert a filesystem path under `root` to its entry path
pub fn relative_entry_path(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!("{:?} is not under root {:?}", path, root))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "Unexpected component in {:?}",
                    relative
                )))
            }
        }
    }
    normalize_entry_path(&parts.join("/"))
}

/// Resolve an entry path to a filesystem location under `root`
pub fn entry_fs_path(root: &Path, entry_path: &str) -> Result<PathBuf, StorageError> {
    let normalized = normalize_entry_path(entry_path)?;
    Ok(normalized
        .split('/')
        .fold(root.to_path_buf(), |acc, part| acc.join(part)))
}
