//! StructureStore: tombstone semantics over a replicated entry store

use super::{AddOutcome, EntryRecord, EntryStore, FileEntry, MergeReport, Register, Stamp};
use crate::error::StorageError;
use crate::tree::path::normalize_entry_path;
use crate::types::{ContentHash, Identity, ReplicaId};
use tracing::{debug, warn};

/// The Structure Store for one replica.
///
/// Mutates the document, plus the local materialization record its backend
/// keeps beside it. It never touches the disk or the ledger.
pub struct StructureStore {
    backend: Box<dyn EntryStore>,
    replica: ReplicaId,
    clock: u64,
}

impl StructureStore {
    /// Open the store over a backend, seeding the Lamport clock from the
    /// highest counter already recorded.
    pub fn open(
        backend: Box<dyn EntryStore>,
        replica: impl Into<ReplicaId>,
    ) -> Result<Self, StorageError> {
        let clock = backend
            .list_all()?
            .iter()
            .map(EntryRecord::max_counter)
            .max()
            .unwrap_or(0);
        Ok(Self {
            backend,
            replica: replica.into(),
            clock,
        })
    }

    pub fn replica(&self) -> &str {
        &self.replica
    }

    pub fn get_entry(&self, path: &str) -> Result<Option<FileEntry>, StorageError> {
        Ok(self.backend.get(path)?.map(|record| record.to_entry()))
    }

    fn record(&self, path: &str) -> Result<(String, EntryRecord), StorageError> {
        let path = normalize_entry_path(path)?;
        let record = self
            .backend
            .get(&path)?
            .ok_or_else(|| StorageError::EntryNotFound(path.clone()))?;
        Ok((path, record))
    }

    /// Create, resurrect or update the entry at `path`.
    pub fn add_file(&mut self, path: &str, content: Vec<u8>) -> Result<AddOutcome, StorageError> {
        let path = normalize_entry_path(path)?;
        let stamp = self.tick();

        let (record, outcome) = match self.backend.get(&path)? {
            None => {
                let record = EntryRecord {
                    identity: Register::new(new_identity(&path, &stamp), stamp.clone()),
                    created_at: Register::new(next_created_at(None), stamp.clone()),
                    tombstone: Register::new(None, stamp.clone()),
                    content: Register::new(content, stamp),
                    path: path.clone(),
                };
                (record, AddOutcome::Created)
            }
            Some(mut record) if record.is_deleted() => {
                let previous = *record.created_at.value();
                record
                    .identity
                    .set(new_identity(&path, &stamp), stamp.clone());
                record
                    .created_at
                    .set(next_created_at(Some(previous)), stamp.clone());
                record.tombstone.set(None, stamp.clone());
                record.content.set(content, stamp);
                (record, AddOutcome::Resurrected)
            }
            Some(mut record) => {
                record.content.set(content, stamp);
                (record, AddOutcome::Updated)
            }
        };

        self.backend.put(&record)?;
        debug!(path = %path, outcome = ?outcome, "Wrote entry");
        Ok(outcome)
    }

    /// Tombstone the entry at `path`.
    ///
    /// The content register is left alone; the tombstone names the content
    /// write it covers, so a concurrent edit stays visible after a merge.
    pub fn remove_file(&mut self, path: &str) -> Result<(), StorageError> {
        let (path, mut record) = self.record(path)?;
        let stamp = self.tick();
        let seen = record.content.stamp().clone();
        record.tombstone.set(Some(seen), stamp);
        self.backend.put(&record)?;
        debug!(path = %path, "Tombstoned entry");
        Ok(())
    }

    /// Paths whose entries are not tombstoned
    pub fn list_paths(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .backend
            .list_all()?
            .into_iter()
            .filter(|record| !record.is_deleted())
            .map(|record| record.path)
            .collect())
    }

    pub fn list_all_paths_including_deleted(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .backend
            .list_all()?
            .into_iter()
            .map(|record| record.path)
            .collect())
    }

    pub fn is_deleted(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.record(path)?.1.is_deleted())
    }

    /// Clear the tombstone while keeping identity and content as merged.
    pub fn clear_tombstone(&mut self, path: &str) -> Result<(), StorageError> {
        let (_, mut record) = self.record(path)?;
        let stamp = self.tick();
        record.tombstone.set(None, stamp);
        self.backend.put(&record)?;
        Ok(())
    }

    /// Content hash last materialized at `path` on this machine
    pub fn materialized(&self, path: &str) -> Result<Option<ContentHash>, StorageError> {
        self.backend.materialized(path)
    }

    pub fn record_materialized(
        &mut self,
        path: &str,
        hash: ContentHash,
    ) -> Result<(), StorageError> {
        self.backend.set_materialized(path, Some(hash))
    }

    pub fn forget_materialized(&mut self, path: &str) -> Result<(), StorageError> {
        self.backend.set_materialized(path, None)
    }

    /// Make all writes so far durable in the backend
    pub fn flush(&self) -> Result<(), StorageError> {
        self.backend.flush()
    }

    /// Full snapshot of the document for a peer
    pub fn export(&self) -> Result<Vec<EntryRecord>, StorageError> {
        self.backend.list_all()
    }

    /// Join remote records into the local document.
    pub fn merge<I>(&mut self, records: I) -> Result<MergeReport, StorageError>
    where
        I: IntoIterator<Item = EntryRecord>,
    {
        let mut report = MergeReport::default();

        for mut remote in records {
            match normalize_entry_path(&remote.path) {
                Ok(path) => remote.path = path,
                Err(e) => {
                    warn!(path = %remote.path, error = %e, "Rejected remote entry");
                    report.rejected.push(remote.path);
                    continue;
                }
            }

            self.clock = self.clock.max(remote.max_counter());

            let changed = match self.backend.get(&remote.path)? {
                None => {
                    self.backend.put(&remote)?;
                    true
                }
                Some(mut local) => {
                    if local.join(&remote) {
                        self.backend.put(&local)?;
                        true
                    } else {
                        false
                    }
                }
            };
            if changed {
                report.changed.insert(remote.path);
            }
        }

        debug!(
            changed = report.changed.len(),
            rejected = report.rejected.len(),
            "Merged remote records"
        );
        Ok(report)
    }

    fn tick(&mut self) -> Stamp {
        self.clock += 1;
        Stamp::new(self.clock, self.replica.clone())
    }
}

fn new_identity(path: &str, stamp: &Stamp) -> Identity {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = blake3::Hasher::new();
    hasher.update(stamp.replica.as_bytes());
    hasher.update(&stamp.counter.to_le_bytes());
    hasher.update(path.as_bytes());
    hasher.update(&nanos.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// Wall-clock milliseconds, forced past the previous value for this path
fn next_created_at(previous: Option<i64>) -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    match previous {
        Some(prev) => now.max(prev + 1),
        None => now,
    }
}
