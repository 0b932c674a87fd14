//! FlushScheduler request coalescing

use super::test_utils::{memory_reconciler, GatedDisk};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use vellum::document::MemoryEntryStore;
use vellum::tree::MemoryDisk;
use vellum::FlushScheduler;

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_requests_during_a_pass_coalesce_into_one() {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    let (gated, gate) = GatedDisk::new(disk.clone());
    let reconciler = Arc::new(memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(gated),
        &temp_dir.path().join("ledger.json"),
    ));
    let scheduler = FlushScheduler::spawn(Arc::clone(&reconciler), None).unwrap();

    reconciler.write_file("n.md", b"x".to_vec()).unwrap();
    scheduler.request().unwrap();
    gate.entered.recv().unwrap();

    // The first pass is blocked inside the disk, holding the reconciliation
    // lock; these requests pile up behind it without blocking.
    for _ in 0..5 {
        scheduler.request().unwrap();
    }
    gate.release.send(()).unwrap();

    wait_for(|| scheduler.passes() >= 2);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(scheduler.passes(), 2);
    assert!(disk.contains("n.md"));
    let last = scheduler.last_report().unwrap();
    assert!(last.is_quiescent());
    scheduler.shutdown().unwrap();
}

#[test]
fn test_shutdown_waits_for_in_flight_pass() {
    let temp_dir = TempDir::new().unwrap();
    let disk = MemoryDisk::new();
    let (gated, gate) = GatedDisk::new(disk.clone());
    let reconciler = Arc::new(memory_reconciler(
        "a",
        &MemoryEntryStore::new(),
        Box::new(gated),
        &temp_dir.path().join("ledger.json"),
    ));
    let scheduler = FlushScheduler::spawn(Arc::clone(&reconciler), None).unwrap();

    scheduler.request().unwrap();
    gate.entered.recv().unwrap();
    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        gate.release.send(()).unwrap();
    });

    scheduler.shutdown().unwrap();
    releaser.join().unwrap();
    assert!(reconciler.flush().is_ok());
}
