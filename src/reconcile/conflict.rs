//! Conflict Resolver
//!
//! Runs once per completed merge, before the next flush. A pure function of the
//! merged entry: it never looks at the ledger, so every machine resolves the
//! same merged entry the same way.

use crate::document::{FileEntry, StructureStore};
use crate::error::StorageError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Entry is live; nothing to resolve
    Live,
    /// Tombstone with no surviving content stays deleted
    DeletionWins,
    /// Content written alongside or after the deletion; tombstone is cleared
    ContentWins,
}

pub fn resolve(entry: &FileEntry) -> Resolution {
    match (entry.deleted, entry.has_content()) {
        (false, _) => Resolution::Live,
        (true, false) => Resolution::DeletionWins,
        (true, true) => Resolution::ContentWins,
    }
}

/// Resolve every changed path, clearing tombstones where content wins.
pub fn apply(
    store: &mut StructureStore,
    changed: &BTreeSet<String>,
) -> Result<BTreeMap<String, Resolution>, StorageError> {
    let mut resolutions = BTreeMap::new();
    for path in changed {
        let Some(entry) = store.get_entry(path)? else {
            continue;
        };
        let resolution = resolve(&entry);
        if resolution == Resolution::ContentWins {
            store.clear_tombstone(path)?;
        }
        debug!(path = %path, resolution = ?resolution, "Resolved merged entry");
        resolutions.insert(path.clone(), resolution);
    }
    Ok(resolutions)
}
