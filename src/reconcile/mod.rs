//! Reconciler
//!
//! Keeps one mirror root consistent with the Structure Store. `scan()` brings
//! disk files into the store, `flush()` writes the store back to disk, and
//! `apply_merge()` joins a peer snapshot and runs the Conflict Resolver.
//!
//! Every pass holds one exclusive lock over the store and the ledger, so
//! passes on one machine never interleave.

pub mod conflict;
pub mod decision;
pub mod flush;
pub mod outcome;
pub mod scan;
pub mod scheduler;

pub use conflict::Resolution;
pub use outcome::{PassKind, PassReport, PassSummary, PathOutcome};
pub use scheduler::FlushScheduler;

use crate::config::VellumConfig;
use crate::document::{
    AddOutcome, EntryRecord, FileEntry, MergeReport, SledEntryStore, StructureStore,
};
use crate::error::{ApiError, LedgerError};
use crate::ledger::KnownPathsLedger;
use crate::tree::path::canonicalize_root;
use crate::tree::walker::WalkerConfig;
use crate::tree::{Disk, LocalDisk};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a pass mutates, guarded together
pub struct ReconcileState {
    pub store: StructureStore,
    pub ledger: KnownPathsLedger,
}

/// Result of applying a peer snapshot
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub changed: Vec<String>,
    pub rejected: Vec<String>,
    pub resolutions: BTreeMap<String, Resolution>,
}

/// Point-in-time view for `status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub replica: String,
    pub tracked: usize,
    pub tombstoned: usize,
    pub ledger_entries: usize,
    pub ledger_file: PathBuf,
    pub ledger_degraded: bool,
    pub ledger_warning: Option<String>,
}

pub struct Reconciler {
    state: Mutex<ReconcileState>,
    disk: Box<dyn Disk>,
}

impl Reconciler {
    pub fn new(store: StructureStore, ledger: KnownPathsLedger, disk: Box<dyn Disk>) -> Self {
        Self {
            state: Mutex::new(ReconcileState { store, ledger }),
            disk,
        }
    }

    /// Open the reconciler for a mirror root using the configured storage.
    pub fn open(root: &Path, config: &VellumConfig) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let root = canonicalize_root(root)?;
        let paths = config.system.storage.resolve_paths(&root)?;

        let backend = SledEntryStore::new(&paths.document)?;
        let replica = match &config.reconcile.replica_id {
            Some(replica) => replica.clone(),
            None => backend.replica_id()?,
        };
        let store = StructureStore::open(Box::new(backend), replica)?;
        let ledger = KnownPathsLedger::load(&paths.ledger, config.reconcile.save_policy());

        let walker_config = WalkerConfig {
            ignore_patterns: config.reconcile.ignore_patterns.clone(),
            ..WalkerConfig::default()
        };
        let disk = LocalDisk::new(root.clone()).with_walker_config(walker_config);

        info!(
            root = ?root,
            replica = %store.replica(),
            document = ?paths.document,
            ledger = ?paths.ledger,
            "Opened reconciler"
        );
        Ok(Self::new(store, ledger, Box::new(disk)))
    }

    pub fn scan(&self) -> Result<PassReport, ApiError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        scan::run(
            &mut state.store,
            &mut state.ledger,
            self.disk.as_ref(),
        )
    }

    pub fn flush(&self) -> Result<PassReport, ApiError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        flush::run(
            &mut state.store,
            &mut state.ledger,
            self.disk.as_ref(),
        )
    }

    /// Scan then flush without releasing the lock in between
    pub fn sync(&self) -> Result<(PassReport, PassReport), ApiError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let scanned = scan::run(
            &mut state.store,
            &mut state.ledger,
            self.disk.as_ref(),
        )?;
        let flushed = flush::run(
            &mut state.store,
            &mut state.ledger,
            self.disk.as_ref(),
        )?;
        Ok((scanned, flushed))
    }

    /// Join a peer snapshot and resolve every changed path. The disk is left
    /// alone until the next flush.
    pub fn apply_merge<I>(&self, records: I) -> Result<MergeOutcome, ApiError>
    where
        I: IntoIterator<Item = EntryRecord>,
    {
        let mut state = self.state.lock();
        let MergeReport { changed, rejected } = state.store.merge(records)?;
        let resolutions = conflict::apply(&mut state.store, &changed)?;
        state.store.flush()?;

        info!(
            changed = changed.len(),
            rejected = rejected.len(),
            "Applied merge"
        );
        Ok(MergeOutcome {
            changed: changed.into_iter().collect(),
            rejected,
            resolutions,
        })
    }

    /// Record a local write in the store
    pub fn write_file(&self, path: &str, content: Vec<u8>) -> Result<AddOutcome, ApiError> {
        let mut state = self.state.lock();
        let outcome = state.store.add_file(path, content)?;
        state.store.flush()?;
        Ok(outcome)
    }

    /// Record a local deletion in the store; the next flush removes the file
    pub fn delete_file(&self, path: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.store.remove_file(path)?;
        state.store.flush()?;
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<EntryRecord>, ApiError> {
        Ok(self.state.lock().store.export()?)
    }

    pub fn entry(&self, path: &str) -> Result<Option<FileEntry>, ApiError> {
        Ok(self.state.lock().store.get_entry(path)?)
    }

    pub fn ledger_contains(&self, path: &str) -> bool {
        self.state.lock().ledger.contains(path)
    }

    pub fn ledger_paths(&self) -> Vec<String> {
        self.state
            .lock()
            .ledger
            .paths()
            .map(str::to_string)
            .collect()
    }

    pub fn is_ledger_degraded(&self) -> bool {
        self.state.lock().ledger.is_degraded()
    }

    pub fn status(&self) -> Result<StatusReport, ApiError> {
        let state = self.state.lock();
        let all = state.store.list_all_paths_including_deleted()?.len();
        let tracked = state.store.list_paths()?.len();
        Ok(StatusReport {
            replica: state.store.replica().to_string(),
            tracked,
            tombstoned: all - tracked,
            ledger_entries: state.ledger.len(),
            ledger_file: state.ledger.file().to_path_buf(),
            ledger_degraded: state.ledger.is_degraded(),
            ledger_warning: state.ledger.load_warning().map(|e| e.to_string()),
        })
    }
}

/// Ledger updates follow a disk operation that already succeeded, so a failed
/// save does not fail the path. The ledger itself tracks degraded mode.
pub(crate) fn note_ledger_result(path: &str, result: Result<(), LedgerError>) {
    match result {
        Ok(()) => debug!(path = %path, "Ledger updated"),
        Err(e) => warn!(path = %path, error = %e, "Ledger update not persisted"),
    }
}
