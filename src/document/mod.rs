//! Structure Store
//!
//! Wraps the replicated document that describes which files exist. One entry per
//! path; deletion replaces an entry with a tombstone instead of removing it, so
//! the deletion can propagate to every replica that still references the path.

pub mod memory;
pub mod persistence;
pub mod register;
pub mod structure;

pub use memory::MemoryEntryStore;
pub use persistence::SledEntryStore;
pub use register::{Register, Stamp};
pub use structure::StructureStore;

use crate::error::StorageError;
use crate::types::{content_hash, ContentHash, Identity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// FileEntry: the merged, read-only view of one path in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub identity: Identity,
    /// Unix milliseconds of creation or latest resurrection
    pub created_at: i64,
    pub deleted: bool,
    pub content: Vec<u8>,
}

impl FileEntry {
    /// Content reference compared by flush to detect remote edits
    pub fn content_hash(&self) -> ContentHash {
        content_hash(&self.content)
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.created_at)
    }
}

/// EntryRecord: replicated form of a FileEntry
///
/// Each field is an independent register, so the tombstone and `content`
/// converge on their own when replicas merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub path: String,
    pub identity: Register<Identity>,
    pub created_at: Register<i64>,
    /// `Some(seen)` marks the entry deleted. `seen` is the stamp of the content
    /// write the deleting replica had observed; content stamped later was
    /// written concurrently with or after the deletion.
    pub tombstone: Register<Option<Stamp>>,
    pub content: Register<Vec<u8>>,
}

impl EntryRecord {
    /// Join a remote copy of the same path into this record.
    ///
    /// Returns true if any field changed.
    pub fn join(&mut self, other: &EntryRecord) -> bool {
        debug_assert_eq!(self.path, other.path);
        let mut changed = false;
        changed |= self.identity.join(&other.identity);
        changed |= self.created_at.join(&other.created_at);
        changed |= self.tombstone.join(&other.tombstone);
        changed |= self.content.join(&other.content);
        changed
    }

    /// Highest Lamport counter among the record's fields
    pub fn max_counter(&self) -> u64 {
        [
            self.identity.stamp().counter,
            self.created_at.stamp().counter,
            self.tombstone.stamp().counter,
            self.content.stamp().counter,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn is_deleted(&self) -> bool {
        self.tombstone.value().is_some()
    }

    /// True when the deletion observed the current content write
    pub fn deletion_covers_content(&self) -> bool {
        match self.tombstone.value() {
            Some(seen) => self.content.stamp() <= seen,
            None => false,
        }
    }

    /// Merged view. A tombstone shows only the content that outlived the
    /// deletion, so content the deleter had already seen reads as empty.
    pub fn to_entry(&self) -> FileEntry {
        let content = if self.deletion_covers_content() {
            Vec::new()
        } else {
            self.content.value().clone()
        };
        FileEntry {
            path: self.path.clone(),
            identity: *self.identity.value(),
            created_at: *self.created_at.value(),
            deleted: self.is_deleted(),
            content,
        }
    }
}

/// What `add_file` did to the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    Resurrected,
    Updated,
}

/// Merge-completed notification: which paths changed in the local view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub changed: BTreeSet<String>,
    /// Remote records rejected because their path is unusable on this machine
    pub rejected: Vec<String>,
}

/// Persistence backend for entry records
pub trait EntryStore: Send {
    fn get(&self, path: &str) -> Result<Option<EntryRecord>, StorageError>;
    fn put(&self, record: &EntryRecord) -> Result<(), StorageError>;

    /// All records, tombstones included, ordered by path
    fn list_all(&self) -> Result<Vec<EntryRecord>, StorageError>;

    /// Content hash last materialized on this machine's disk at `path`.
    ///
    /// Local state kept beside the document; never exported or merged.
    fn materialized(&self, path: &str) -> Result<Option<ContentHash>, StorageError>;

    /// Record (or with `None`, forget) the materialized content hash
    fn set_materialized(
        &self,
        path: &str,
        hash: Option<ContentHash>,
    ) -> Result<(), StorageError>;

    /// Make every preceding write durable
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
