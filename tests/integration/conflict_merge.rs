//! Merges between replicas and the Conflict Resolver

use super::test_utils::memory_reconciler;
use tempfile::TempDir;
use vellum::document::{MemoryEntryStore, StructureStore};
use vellum::reconcile::Resolution;
use vellum::tree::MemoryDisk;
use vellum::{PathOutcome, Reconciler};

struct Replica {
    reconciler: Reconciler,
    disk: MemoryDisk,
}

fn replica(name: &str, temp_dir: &TempDir) -> Replica {
    let disk = MemoryDisk::new();
    let reconciler = memory_reconciler(
        name,
        &MemoryEntryStore::new(),
        Box::new(disk.clone()),
        &temp_dir.path().join(format!("{}.json", name)),
    );
    Replica { reconciler, disk }
}

fn exchange(from: &Replica, to: &Replica) -> vellum::reconcile::MergeOutcome {
    to.reconciler
        .apply_merge(from.reconciler.export().unwrap())
        .unwrap()
}

/// Deleter and editor both start from v1 and each makes a single change.
fn race_delete_against_edit(deleter: &Replica, editor: &Replica) {
    deleter.reconciler.write_file("n.md", b"v1".to_vec()).unwrap();
    exchange(deleter, editor);

    deleter.reconciler.delete_file("n.md").unwrap();
    editor.reconciler.write_file("n.md", b"v2".to_vec()).unwrap();
}

fn assert_edit_survived(replica: &Replica, outcome: &vellum::reconcile::MergeOutcome) {
    assert_eq!(outcome.resolutions["n.md"], Resolution::ContentWins);
    let merged = replica.reconciler.entry("n.md").unwrap().unwrap();
    assert!(!merged.deleted);
    assert_eq!(merged.content, b"v2");
}

#[test]
fn test_concurrent_edit_beats_delete() {
    let temp_dir = TempDir::new().unwrap();
    let z = replica("z", &temp_dir);
    let a = replica("a", &temp_dir);
    race_delete_against_edit(&z, &a);
    let identity = a.reconciler.entry("n.md").unwrap().unwrap().identity;

    let outcome = exchange(&a, &z);
    assert_edit_survived(&z, &outcome);
    assert_eq!(z.reconciler.entry("n.md").unwrap().unwrap().identity, identity);

    let report = z.reconciler.flush().unwrap();
    assert_eq!(report.outcome("n.md"), Some(&PathOutcome::Written));
    assert_eq!(z.disk.get("n.md").unwrap(), b"v2");
}

#[test]
fn test_concurrent_edit_beats_delete_on_editor_side() {
    let temp_dir = TempDir::new().unwrap();
    let z = replica("z", &temp_dir);
    let a = replica("a", &temp_dir);
    race_delete_against_edit(&z, &a);

    let outcome = exchange(&z, &a);
    assert_edit_survived(&a, &outcome);
}

#[test]
fn test_concurrent_edit_beats_delete_with_swapped_replica_ids() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let z = replica("z", &temp_dir);
    race_delete_against_edit(&a, &z);

    let on_deleter = exchange(&z, &a);
    assert_edit_survived(&a, &on_deleter);
    let on_editor = exchange(&a, &z);
    assert_eq!(on_editor.resolutions["n.md"], Resolution::Live);
    assert_eq!(a.reconciler.export().unwrap(), z.reconciler.export().unwrap());
    assert_eq!(z.reconciler.entry("n.md").unwrap().unwrap().content, b"v2");
}

#[test]
fn test_delete_after_seen_edit_wins() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let b = replica("b", &temp_dir);

    a.reconciler.write_file("n.md", b"v1".to_vec()).unwrap();
    exchange(&a, &b);
    b.reconciler.write_file("n.md", b"v2".to_vec()).unwrap();
    exchange(&b, &a);
    a.reconciler.delete_file("n.md").unwrap();

    let outcome = exchange(&a, &b);
    assert_eq!(outcome.resolutions["n.md"], Resolution::DeletionWins);
    assert!(b.reconciler.entry("n.md").unwrap().unwrap().deleted);
}

#[test]
fn test_double_tombstone_stays_deleted() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let b = replica("b", &temp_dir);

    a.reconciler.write_file("n.md", b"v1".to_vec()).unwrap();
    exchange(&a, &b);
    a.reconciler.delete_file("n.md").unwrap();
    b.reconciler.delete_file("n.md").unwrap();

    exchange(&a, &b);
    exchange(&b, &a);
    for side in [&a, &b] {
        let entry = side.reconciler.entry("n.md").unwrap().unwrap();
        assert!(entry.deleted);
        assert!(entry.content.is_empty());
    }
    assert_eq!(a.reconciler.export().unwrap(), b.reconciler.export().unwrap());
}

#[test]
fn test_resolver_ignores_ledger_state() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let b = replica("b", &temp_dir);
    let c = replica("c", &temp_dir);

    a.reconciler.write_file("n.md", b"v1".to_vec()).unwrap();
    exchange(&a, &b);
    exchange(&a, &c);
    // Only b has the path in its ledger.
    b.reconciler.flush().unwrap();
    assert!(b.reconciler.ledger_contains("n.md"));
    assert!(!c.reconciler.ledger_contains("n.md"));

    a.reconciler.delete_file("n.md").unwrap();
    let on_b = exchange(&a, &b);
    let on_c = exchange(&a, &c);
    assert_eq!(on_b.resolutions, on_c.resolutions);
}

#[test]
fn test_merge_order_does_not_matter() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let b = replica("b", &temp_dir);

    a.reconciler.write_file("shared.md", b"a1".to_vec()).unwrap();
    exchange(&a, &b);
    a.reconciler.write_file("only-a.md", b"a".to_vec()).unwrap();
    a.reconciler.delete_file("shared.md").unwrap();
    b.reconciler.write_file("only-b.md", b"b".to_vec()).unwrap();
    b.reconciler.write_file("shared.md", b"b1".to_vec()).unwrap();

    let snapshot_a = a.reconciler.export().unwrap();
    let snapshot_b = b.reconciler.export().unwrap();

    let mut ab = StructureStore::open(Box::new(MemoryEntryStore::new()), "x").unwrap();
    ab.merge(snapshot_a.clone()).unwrap();
    ab.merge(snapshot_b.clone()).unwrap();
    let mut ba = StructureStore::open(Box::new(MemoryEntryStore::new()), "y").unwrap();
    ba.merge(snapshot_b).unwrap();
    ba.merge(snapshot_a).unwrap();

    assert_eq!(ab.export().unwrap(), ba.export().unwrap());
}

#[test]
fn test_merge_rejects_paths_outside_root() {
    let temp_dir = TempDir::new().unwrap();
    let a = replica("a", &temp_dir);
    let b = replica("b", &temp_dir);
    a.reconciler.write_file("ok.md", b"1".to_vec()).unwrap();

    let mut records = a.reconciler.export().unwrap();
    let mut evil = records[0].clone();
    evil.path = "../../etc/passwd".to_string();
    records.push(evil);

    let outcome = b.reconciler.apply_merge(records).unwrap();
    assert_eq!(outcome.changed, vec!["ok.md".to_string()]);
    assert_eq!(outcome.rejected, vec!["../../etc/passwd".to_string()]);
    b.reconciler.flush().unwrap();
    assert_eq!(b.disk.snapshot().len(), 1);
}
