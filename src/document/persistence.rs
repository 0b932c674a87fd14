//! Persistence layer for the Structure Store

use super::{EntryRecord, EntryStore};
use crate::error::StorageError;
use crate::types::ContentHash;
use std::path::Path;
use tracing::info;

const ENTRY_PREFIX: &str = "entry:";
const REPLICA_KEY: &str = "meta:replica";
const MATERIALIZED_TREE: &str = "materialized";

/// Sled-based implementation of EntryStore
///
/// Records are bincode-encoded under `entry:<path>`. The database also keeps a
/// stable replica id under `meta:replica` so stamps written after a restart
/// keep the same author, and a separate `materialized` tree mapping each path
/// to the content hash last written to or read from this machine's disk.
pub struct SledEntryStore {
    db: sled::Db,
    materialized: sled::Tree,
}

impl SledEntryStore {
    /// Open (or create) the document database at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StorageError::Backend(format!(
                "Failed to open document database at {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let materialized = db.open_tree(MATERIALIZED_TREE)?;
        Ok(Self { db, materialized })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Return the replica id recorded in this database, creating one on first use
    pub fn replica_id(&self) -> Result<String, StorageError> {
        if let Some(existing) = self.db.get(REPLICA_KEY)? {
            return String::from_utf8(existing.to_vec())
                .map_err(|e| StorageError::Codec(format!("Invalid replica id: {}", e)));
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&std::process::id().to_le_bytes());
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&self.db.generate_id()?.to_le_bytes());
        let replica = hex::encode(&hasher.finalize().as_bytes()[..8]);

        self.db.insert(REPLICA_KEY, replica.as_bytes())?;
        self.db.flush()?;
        info!(replica = %replica, "Generated replica id");
        Ok(replica)
    }
}

fn entry_key(path: &str) -> String {
    format!("{}{}", ENTRY_PREFIX, path)
}

impl EntryStore for SledEntryStore {
    fn get(&self, path: &str) -> Result<Option<EntryRecord>, StorageError> {
        match self.db.get(entry_key(path).as_bytes())? {
            Some(value) => {
                let record: EntryRecord = bincode::deserialize(&value)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, record: &EntryRecord) -> Result<(), StorageError> {
        let value = bincode::serialize(record)?;
        self.db.insert(entry_key(&record.path).as_bytes(), value)?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<EntryRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.db.scan_prefix(ENTRY_PREFIX.as_bytes()) {
            let (_, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }
        Ok(records)
    }

    fn materialized(&self, path: &str) -> Result<Option<ContentHash>, StorageError> {
        match self.materialized.get(path.as_bytes())? {
            Some(value) => {
                let hash: ContentHash = value.as_ref().try_into().map_err(|_| {
                    StorageError::Codec(format!("Invalid materialized hash for {}", path))
                })?;
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    fn set_materialized(
        &self,
        path: &str,
        hash: Option<ContentHash>,
    ) -> Result<(), StorageError> {
        match hash {
            Some(hash) => self.materialized.insert(path.as_bytes(), &hash[..])?,
            None => self.materialized.remove(path.as_bytes())?,
        };
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        self.materialized.flush()?;
        Ok(())
    }
}
