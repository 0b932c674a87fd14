//! Any sequence of local operations followed by two flushes: the second is a no-op

use proptest::prelude::*;
use tempfile::TempDir;
use vellum::document::{MemoryEntryStore, StructureStore};
use vellum::ledger::{KnownPathsLedger, SavePolicy};
use vellum::tree::{Disk, MemoryDisk};
use vellum::Reconciler;

#[derive(Debug, Clone)]
enum Op {
    DiskWrite(usize, u8),
    DiskDelete(usize),
    DocWrite(usize, u8),
    DocDelete(usize),
    Scan,
    Flush,
}

const PATHS: [&str; 3] = ["a.md", "dir/b.md", "c.md"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PATHS.len(), any::<u8>()).prop_map(|(p, b)| Op::DiskWrite(p, b)),
        (0..PATHS.len()).prop_map(Op::DiskDelete),
        (0..PATHS.len(), any::<u8>()).prop_map(|(p, b)| Op::DocWrite(p, b)),
        (0..PATHS.len()).prop_map(Op::DocDelete),
        Just(Op::Scan),
        Just(Op::Flush),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn second_flush_changes_nothing(ops in prop::collection::vec(op(), 0..16)) {
        let temp_dir = TempDir::new().unwrap();
        let disk = MemoryDisk::new();
        let store = StructureStore::open(Box::new(MemoryEntryStore::new()), "a").unwrap();
        let ledger = KnownPathsLedger::load(temp_dir.path().join("ledger.json"), SavePolicy::default());
        let reconciler = Reconciler::new(store, ledger, Box::new(disk.clone()));

        for op in ops {
            match op {
                Op::DiskWrite(p, b) => disk.write(PATHS[p], &[b]).unwrap(),
                Op::DiskDelete(p) => {
                    let _ = disk.delete(PATHS[p]);
                }
                Op::DocWrite(p, b) => {
                    reconciler.write_file(PATHS[p], vec![b]).unwrap();
                }
                Op::DocDelete(p) => {
                    let _ = reconciler.delete_file(PATHS[p]);
                }
                Op::Scan => {
                    reconciler.scan().unwrap();
                }
                Op::Flush => {
                    reconciler.flush().unwrap();
                }
            }
        }

        reconciler.flush().unwrap();
        let disk_before = disk.snapshot();
        let ledger_before = reconciler.ledger_paths();
        let export_before = reconciler.export().unwrap();

        let second = reconciler.flush().unwrap();
        prop_assert!(second.is_quiescent(), "{:?}", second.outcomes);
        prop_assert_eq!(disk.snapshot(), disk_before);
        prop_assert_eq!(reconciler.ledger_paths(), ledger_before);
        prop_assert_eq!(reconciler.export().unwrap(), export_before);
    }
}
