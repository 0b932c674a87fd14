//! Vellum: tombstone-aware reconciliation for replicated file sets
//!
//! Keeps a local directory consistent with a replicated document that lists
//! which files exist. Deletions are tombstones, a local known-paths ledger
//! tells stale disk copies apart from new files, and a pure conflict resolver
//! settles delete/edit races after every merge.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod reconcile;
pub mod tree;
pub mod types;

pub use document::{EntryRecord, FileEntry, StructureStore};
pub use ledger::KnownPathsLedger;
pub use reconcile::{FlushScheduler, PassReport, PathOutcome, Reconciler};
