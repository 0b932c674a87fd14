//! Known-Paths Ledger
//!
//! Local, unreplicated memory of which paths this machine has materialized or
//! acknowledged. It is only a tie-breaker for tombstone age: a tombstoned path
//! that is in the ledger was known here before it was deleted, so its disk copy
//! is stale; one that is not in the ledger is treated as newer than the deletion.
//!
//! Membership keys on the path alone, so successive delete/resurrect cycles on
//! the same path are indistinguishable.

use crate::error::LedgerError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Whether the ledger vouches for a path when deciding tombstone age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    InLedger,
    NotInLedger,
}

/// Retry policy for ledger saves
#[derive(Debug, Clone, Copy)]
pub struct SavePolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for SavePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

pub struct KnownPathsLedger {
    file: PathBuf,
    paths: BTreeSet<String>,
    policy: SavePolicy,
    load_warning: Option<LedgerError>,
    degraded: bool,
}

impl KnownPathsLedger {
    /// Load the ledger from `file`.
    ///
    /// Never fails: a missing or malformed file yields an empty ledger and a
    /// warning, which is kept for callers in `load_warning()`.
    pub fn load(file: impl Into<PathBuf>, policy: SavePolicy) -> Self {
        let file = file.into();
        let (paths, load_warning) = match read_paths(&file) {
            Ok(paths) => {
                debug!(path = ?file, entries = paths.len(), "Loaded known-paths ledger");
                (paths, None)
            }
            Err(e) => {
                warn!(
                    path = ?file,
                    error = %e,
                    "Known-paths ledger unavailable; starting empty. Tombstoned files still on disk will be treated as new."
                );
                (BTreeSet::new(), Some(e))
            }
        };

        Self {
            file,
            paths,
            policy,
            load_warning,
            degraded: false,
        }
    }

    /// The non-fatal problem hit while loading, if any
    pub fn load_warning(&self) -> Option<&LedgerError> {
        self.load_warning.as_ref()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Membership as used for tombstone decisions. While degraded every path
    /// reads as unacknowledged.
    pub fn acknowledgement(&self, path: &str) -> Acknowledgement {
        if !self.degraded && self.paths.contains(path) {
            Acknowledgement::InLedger
        } else {
            Acknowledgement::NotInLedger
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Add a path and persist. While degraded the change is kept in memory
    /// until `retry_save` succeeds.
    pub fn add(&mut self, path: &str) -> Result<(), LedgerError> {
        if self.paths.insert(path.to_string()) && !self.degraded {
            self.save()?;
        }
        Ok(())
    }

    /// Remove a path and persist, deferred like `add` while degraded.
    pub fn remove(&mut self, path: &str) -> Result<(), LedgerError> {
        if self.paths.remove(path) && !self.degraded {
            self.save()?;
        }
        Ok(())
    }

    /// Try once more to persist a degraded ledger. Passes call this before
    /// their first decision so the retry cost is paid once per pass.
    pub fn retry_save(&mut self) -> Result<(), LedgerError> {
        if self.degraded {
            self.save()?;
        }
        Ok(())
    }

    /// Persist the current set, retrying per the save policy.
    ///
    /// Exhausting the retries puts the ledger in degraded mode; the next
    /// successful save leaves it.
    pub fn save(&mut self) -> Result<(), LedgerError> {
        let attempts = self.policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match write_paths(&self.file, &self.paths) {
                Ok(()) => {
                    if self.degraded {
                        info!(path = ?self.file, "Known-paths ledger persisted again; leaving degraded mode");
                        self.degraded = false;
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(path = ?self.file, attempt, error = %e, "Failed to persist known-paths ledger");
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(self.policy.backoff * attempt);
                    }
                }
            }
        }

        self.degraded = true;
        let source = last_error
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "unknown"));
        error!(
            path = ?self.file,
            attempts,
            error = %source,
            "Known-paths ledger cannot be persisted. Tombstone decisions now treat every path as new and may resurrect files deleted by peers."
        );
        Err(LedgerError::PersistFailed {
            path: self.file.clone(),
            attempts,
            source,
        })
    }
}

fn read_paths(file: &Path) -> Result<BTreeSet<String>, LedgerError> {
    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LedgerError::Missing(file.to_path_buf()))
        }
        Err(e) => return Err(LedgerError::Io(e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeSet::new());
    }

    let paths: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Corrupt {
        path: file.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(paths.into_iter().collect())
}

/// Write via a sibling temp file and rename, so a crash leaves either the old
/// or the new ledger on disk.
fn write_paths(file: &Path, paths: &BTreeSet<String>) -> std::io::Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    let list: Vec<&String> = paths.iter().collect();
    let bytes = serde_json::to_vec_pretty(&list)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut tmp = file.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, file)
}
