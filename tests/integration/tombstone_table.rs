//! Flush outcome for every (store state, ledger membership, disk presence) combination

use super::test_utils::memory_reconciler;
use tempfile::TempDir;
use vellum::document::MemoryEntryStore;
use vellum::tree::{Disk, MemoryDisk};
use vellum::{PathOutcome, Reconciler};

#[derive(Debug, Clone, Copy)]
enum Case {
    TombstonedInLedgerOnDisk,
    TombstonedInLedgerAbsent,
    TombstonedUnknownOnDisk,
    TombstonedUnknownAbsent,
    TrackedInLedgerOnDisk,
    TrackedInLedgerAbsent,
    TrackedUnknownOnDisk,
    TrackedUnknownAbsent,
    UntrackedOnDisk,
}

const PATH: &str = "n.md";

/// Drive a fresh reconciler into the case's state using public operations only.
fn arrange(case: Case, reconciler: &Reconciler, disk: &MemoryDisk) {
    match case {
        Case::TombstonedInLedgerOnDisk => {
            disk.write(PATH, b"x").unwrap();
            reconciler.scan().unwrap();
            reconciler.delete_file(PATH).unwrap();
        }
        Case::TombstonedInLedgerAbsent => {
            disk.write(PATH, b"x").unwrap();
            reconciler.scan().unwrap();
            reconciler.delete_file(PATH).unwrap();
            disk.delete(PATH).unwrap();
        }
        Case::TombstonedUnknownOnDisk => {
            reconciler.write_file(PATH, b"x".to_vec()).unwrap();
            reconciler.delete_file(PATH).unwrap();
            disk.write(PATH, b"y").unwrap();
        }
        Case::TombstonedUnknownAbsent => {
            reconciler.write_file(PATH, b"x".to_vec()).unwrap();
            reconciler.delete_file(PATH).unwrap();
        }
        Case::TrackedInLedgerOnDisk => {
            disk.write(PATH, b"x").unwrap();
            reconciler.scan().unwrap();
        }
        Case::TrackedInLedgerAbsent => {
            disk.write(PATH, b"x").unwrap();
            reconciler.scan().unwrap();
            disk.delete(PATH).unwrap();
        }
        Case::TrackedUnknownOnDisk => {
            reconciler.write_file(PATH, b"x".to_vec()).unwrap();
            disk.write(PATH, b"x").unwrap();
        }
        Case::TrackedUnknownAbsent => {
            reconciler.write_file(PATH, b"x".to_vec()).unwrap();
        }
        Case::UntrackedOnDisk => {
            disk.write(PATH, b"x").unwrap();
        }
    }
}

/// (outcome, on disk afterwards, in ledger afterwards)
fn flush_case(case: Case) -> (PathOutcome, bool, bool) {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    let reconciler = memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(disk.clone()),
        &temp_dir.path().join("ledger.json"),
    );
    arrange(case, &reconciler, &disk);

    let report = reconciler.flush().unwrap();
    (
        report.outcome(PATH).cloned().unwrap(),
        disk.contains(PATH),
        reconciler.ledger_contains(PATH),
    )
}

#[test]
fn test_tombstone_table() {
    use PathOutcome::*;
    let table = [
        (Case::TombstonedInLedgerOnDisk, Deleted, false, false),
        (Case::TombstonedInLedgerAbsent, Unchanged, false, false),
        (Case::TombstonedUnknownOnDisk, Resurrected, true, true),
        (Case::TombstonedUnknownAbsent, Unchanged, false, false),
        (Case::TrackedInLedgerOnDisk, Unchanged, true, true),
        (Case::TrackedInLedgerAbsent, Written, true, true),
        (Case::TrackedUnknownOnDisk, Unchanged, true, true),
        (Case::TrackedUnknownAbsent, Written, true, true),
        (Case::UntrackedOnDisk, Unchanged, true, false),
    ];

    for (case, outcome, on_disk, in_ledger) in table {
        assert_eq!(
            flush_case(case),
            (outcome, on_disk, in_ledger),
            "case {:?}",
            case
        );
    }
}

#[test]
fn test_tombstone_table_is_deterministic() {
    let cases = [
        Case::TombstonedInLedgerOnDisk,
        Case::TombstonedUnknownOnDisk,
        Case::TrackedInLedgerAbsent,
        Case::UntrackedOnDisk,
    ];
    for case in cases {
        assert_eq!(flush_case(case), flush_case(case), "case {:?}", case);
    }
}
