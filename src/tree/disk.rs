//! Filesystem collaborator used by the reconciler
//!
//! All paths are entry paths (relative, `/`-separated). Each operation fails
//! with a classified `FsError` so a pass can tell "already gone" apart from a
//! real failure.

use crate::error::FsError;
use crate::tree::path::entry_fs_path;
use crate::tree::walker::{Walker, WalkerConfig};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub trait Disk: Send + Sync {
    /// All file paths under the root, sorted
    fn list_paths(&self) -> Result<Vec<String>, FsError>;
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;
    /// Whole-file replace, creating parent directories as needed
    fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError>;
    fn delete(&self, path: &str) -> Result<(), FsError>;

    /// Paths this disk never lists and refuses to touch
    fn is_ignored(&self, _path: &str) -> bool {
        false
    }
}

/// Disk backed by a real directory
pub struct LocalDisk {
    root: PathBuf,
    walker_config: WalkerConfig,
    /// Where each listed entry actually lives; names may be stored in a
    /// different Unicode form than their entry path
    locations: RwLock<HashMap<String, PathBuf>>,
}

impl LocalDisk {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: WalkerConfig::default(),
            locations: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        if self.walker_config.ignores(path) {
            return Err(FsError::InvalidPath(format!("{} matches an ignore pattern", path)));
        }
        if let Some(location) = self.locations.read().get(path) {
            return Ok(location.clone());
        }
        entry_fs_path(&self.root, path).map_err(|e| FsError::InvalidPath(e.to_string()))
    }

    /// Remove directories left empty by a delete, stopping at the root
    fn prune_empty_parents(&self, file: &Path) {
        let mut current = file.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

impl Disk for LocalDisk {
    fn list_paths(&self) -> Result<Vec<String>, FsError> {
        let files = Walker::with_config(self.root.clone(), self.walker_config.clone()).walk()?;
        let mut locations = HashMap::with_capacity(files.len());
        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            match locations.entry(file.path) {
                Entry::Occupied(existing) => warn!(
                    path = %existing.key(),
                    kept = ?existing.get(),
                    skipped = ?file.fs_path,
                    "Two files normalize to the same entry path"
                ),
                Entry::Vacant(slot) => {
                    paths.push(slot.key().clone());
                    slot.insert(file.fs_path);
                }
            }
        }
        *self.locations.write() = locations;
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let fs_path = self.resolve(path)?;
        fs::read(&fs_path).map_err(|e| FsError::from_io(path, e))
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let fs_path = self.resolve(path)?;
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::from_io(path, e))?;
        }
        fs::write(&fs_path, content).map_err(|e| FsError::from_io(path, e))?;
        self.locations.write().insert(path.to_string(), fs_path);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let fs_path = self.resolve(path)?;
        fs::remove_file(&fs_path).map_err(|e| FsError::from_io(path, e))?;
        self.locations.write().remove(path);
        self.prune_empty_parents(&fs_path);
        Ok(())
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.walker_config.ignores(path)
    }
}

/// In-process disk, used for tests and multi-replica simulations.
/// Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisk {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryDisk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.read().clone()
    }
}

impl Disk for MemoryDisk {
    fn list_paths(&self) -> Result<Vec<String>, FsError> {
        Ok(self.files.read().keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.files.write().insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }
}
