//! scan(): disk to Structure Store

use super::test_utils::memory_reconciler;
use tempfile::TempDir;
use vellum::document::MemoryEntryStore;
use vellum::tree::{Disk, LocalDisk, MemoryDisk};
use vellum::PathOutcome;

#[test]
fn test_scan_imports_untracked_files() {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    disk.write("a.md", b"alpha").unwrap();
    disk.write("dir/b.md", b"beta").unwrap();
    let reconciler = memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(disk.clone()),
        &temp_dir.path().join("ledger.json"),
    );

    let report = reconciler.scan().unwrap();
    assert_eq!(report.outcome("a.md"), Some(&PathOutcome::Imported));
    assert_eq!(report.outcome("dir/b.md"), Some(&PathOutcome::Imported));
    assert_eq!(
        reconciler.entry("dir/b.md").unwrap().unwrap().content,
        b"beta"
    );
    assert_eq!(reconciler.ledger_paths(), vec!["a.md", "dir/b.md"]);
}

#[test]
fn test_scan_leaves_tracked_entries_alone() {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    let reconciler = memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(disk.clone()),
        &temp_dir.path().join("ledger.json"),
    );
    reconciler.write_file("a.md", b"document".to_vec()).unwrap();
    disk.write("a.md", b"local edit").unwrap();

    let report = reconciler.scan().unwrap();
    assert_eq!(report.outcome("a.md"), Some(&PathOutcome::Unchanged));
    assert_eq!(
        reconciler.entry("a.md").unwrap().unwrap().content,
        b"document"
    );
}

#[test]
fn test_scan_keeps_acknowledged_tombstone() {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    disk.write("n.md", b"x").unwrap();
    let reconciler = memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(disk.clone()),
        &temp_dir.path().join("ledger.json"),
    );
    reconciler.scan().unwrap();
    reconciler.delete_file("n.md").unwrap();

    let report = reconciler.scan().unwrap();
    assert_eq!(report.outcome("n.md"), Some(&PathOutcome::Unchanged));
    assert!(reconciler.entry("n.md").unwrap().unwrap().deleted);
    assert!(disk.contains("n.md"));
}

#[test]
fn test_scan_resurrects_unacknowledged_tombstone() {
    let temp_dir = TempDir::new().unwrap();
    let document = MemoryEntryStore::new();
    let disk = MemoryDisk::new();

    // Another replica created and deleted the path; this machine never saw it.
    let peer = memory_reconciler(
        "peer",
        &MemoryEntryStore::new(),
        Box::new(MemoryDisk::new()),
        &temp_dir.path().join("peer.json"),
    );
    peer.write_file("n.md", b"old".to_vec()).unwrap();
    peer.delete_file("n.md").unwrap();
    let before = peer.entry("n.md").unwrap().unwrap();

    let local = memory_reconciler(
        "local",
        &document,
        Box::new(disk.clone()),
        &temp_dir.path().join("local.json"),
    );
    local.apply_merge(peer.export().unwrap()).unwrap();
    disk.write("n.md", b"fresh").unwrap();

    let report = local.scan().unwrap();
    assert_eq!(report.outcome("n.md"), Some(&PathOutcome::Resurrected));
    let after = local.entry("n.md").unwrap().unwrap();
    assert!(!after.deleted);
    assert_eq!(after.content, b"fresh");
    assert_ne!(after.identity, before.identity);
    assert!(local.ledger_contains("n.md"));
}

#[test]
fn test_scan_imports_decomposed_file_names() {
    let temp_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let decomposed = root.path().join("cafe\u{0301}.md");
    std::fs::write(&decomposed, "menu").unwrap();
    let reconciler = memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(LocalDisk::new(root.path().to_path_buf())),
        &temp_dir.path().join("ledger.json"),
    );

    let report = reconciler.scan().unwrap();
    assert_eq!(report.outcome("caf\u{00e9}.md"), Some(&PathOutcome::Imported));
    assert_eq!(
        reconciler.entry("caf\u{00e9}.md").unwrap().unwrap().content,
        b"menu"
    );

    let flushed = reconciler.flush().unwrap();
    assert!(flushed.is_quiescent(), "{:?}", flushed.outcomes);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    assert!(decomposed.exists());
}
