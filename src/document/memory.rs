//! In-process entry store
//!
//! Clones share the same map, so a test can hand one clone to a reconciler and
//! keep another to reopen the document after simulating a restart.

use super::{EntryRecord, EntryStore};
use crate::error::StorageError;
use crate::types::ContentHash;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    records: Arc<RwLock<BTreeMap<String, EntryRecord>>>,
    materialized: Arc<RwLock<BTreeMap<String, ContentHash>>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EntryStore for MemoryEntryStore {
    fn get(&self, path: &str) -> Result<Option<EntryRecord>, StorageError> {
        Ok(self.records.read().get(path).cloned())
    }

    fn put(&self, record: &EntryRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .insert(record.path.clone(), record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<EntryRecord>, StorageError> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn materialized(&self, path: &str) -> Result<Option<ContentHash>, StorageError> {
        Ok(self.materialized.read().get(path).copied())
    }

    fn set_materialized(
        &self,
        path: &str,
        hash: Option<ContentHash>,
    ) -> Result<(), StorageError> {
        let mut materialized = self.materialized.write();
        match hash {
            Some(hash) => materialized.insert(path.to_string(), hash),
            None => materialized.remove(path),
        };
        Ok(())
    }
}
