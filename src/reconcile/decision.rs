//! Decision tables for scan and flush
//!
//! Both tables are exhaustive matches: adding a state forces every table to
//! say what happens to it.

use crate::document::FileEntry;
use crate::ledger::Acknowledgement;

/// Where a path stands in the Structure Store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    Untracked,
    Tracked,
    Tombstoned,
}

impl Tracking {
    pub fn of(entry: Option<&FileEntry>) -> Self {
        match entry {
            None => Tracking::Untracked,
            Some(entry) if entry.deleted => Tracking::Tombstoned,
            Some(_) => Tracking::Tracked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    /// Add the disk file to the store
    Import,
    /// Revive the tombstone with the disk content
    Resurrect,
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushAction {
    /// Remove the disk copy (if any) and forget the path
    Delete,
    /// Revive the tombstone with the disk content
    Resurrect,
    /// Write store content to a path missing on disk
    Materialize,
    /// Replace the disk copy if the store content moved on
    Refresh,
    NoOp,
}

/// Decide what `scan()` does with a path found on disk.
pub fn scan_action(tracking: Tracking, ack: Acknowledgement) -> ScanAction {
    use Acknowledgement::*;
    match (tracking, ack) {
        (Tracking::Untracked, _) => ScanAction::Import,
        (Tracking::Tombstoned, NotInLedger) => ScanAction::Resurrect,
        // Stale copy of a deletion this machine already saw; flush removes it.
        (Tracking::Tombstoned, InLedger) => ScanAction::NoOp,
        (Tracking::Tracked, _) => ScanAction::NoOp,
    }
}

/// Decide what `flush()` does with a path from the store or the disk.
pub fn flush_action(tracking: Tracking, ack: Acknowledgement, on_disk: bool) -> FlushAction {
    use Acknowledgement::*;
    match (tracking, ack, on_disk) {
        (Tracking::Tombstoned, InLedger, _) => FlushAction::Delete,
        (Tracking::Tombstoned, NotInLedger, true) => FlushAction::Resurrect,
        // Deletion already reflected on disk.
        (Tracking::Tombstoned, NotInLedger, false) => FlushAction::NoOp,
        (Tracking::Tracked, _, false) => FlushAction::Materialize,
        (Tracking::Tracked, _, true) => FlushAction::Refresh,
        // flush never imports
        (Tracking::Untracked, _, _) => FlushAction::NoOp,
    }
}
