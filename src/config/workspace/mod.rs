//! Per-root storage locations.

mod storage_paths;

pub use storage_paths::{StorageConfig, StoragePaths};
