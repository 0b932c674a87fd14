//! Filesystem walker for listing mirror contents

use crate::error::FsError;
use crate::tree::path::relative_entry_path;
use std::path::PathBuf;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// A regular file found under the mirror root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Entry path relative to the root
    pub path: String,
    /// Location as the filesystem spells it, which may differ from `path`
    /// in Unicode normalization form
    pub fs_path: PathBuf,
    pub size: u64,
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
    /// Names to ignore as path components (e.g. ".git"), or `*.ext` suffix patterns
    pub ignore_patterns: Vec<String>,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl WalkerConfig {
    /// True when any component of an entry path matches an ignore pattern
    pub fn ignores(&self, entry_path: &str) -> bool {
        entry_path.split('/').any(|name| self.ignores_name(name))
    }

    fn ignores_name(&self, name: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| matches_pattern(name, pattern))
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: default_ignore_patterns(),
            max_depth: None,
        }
    }
}

pub fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".vellum".to_string(),
        ".DS_Store".to_string(),
        "*.swp".to_string(),
        "*.tmp".to_string(),
    ]
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the root and collect regular files, sorted by entry path.
    ///
    /// Failing to read the root itself is an error; unreadable entries below
    /// it are skipped with a warning.
    pub fn walk(&self) -> Result<Vec<WalkedFile>, FsError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_ignore(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let root = self.root.to_string_lossy().to_string();
                    return Err(match e.into_io_error() {
                        Some(io) => FsError::from_io(&root, io),
                        None => FsError::Io {
                            path: root,
                            source: std::io::Error::new(
                                std::io::ErrorKind::Other,
                                "filesystem loop at root",
                            ),
                        },
                    });
                }
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = match relative_entry_path(&self.root, entry.path()) {
                Ok(path) => path,
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "Skipping file with unusable path");
                    continue;
                }
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(WalkedFile {
                path,
                fs_path: entry.path().to_path_buf(),
                size,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn should_ignore(&self, entry: &DirEntry) -> bool {
        self.config.ignores_name(&entry.file_name().to_string_lossy())
    }
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}
