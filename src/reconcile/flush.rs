//! flush(): Structure Store to disk

use super::decision::{flush_action, FlushAction, Tracking};
use super::note_ledger_result;
use super::outcome::{PassKind, PassReport, PathOutcome};
use crate::document::{FileEntry, StructureStore};
use crate::error::ApiError;
use crate::ledger::KnownPathsLedger;
use crate::tree::Disk;
use crate::types::{content_hash, short_hex};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Make the disk match the store for every path either side knows about.
///
/// Idempotent: a second pass over an unchanged store and disk reports every
/// path as unchanged.
pub fn run(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
) -> Result<PassReport, ApiError> {
    if let Err(e) = ledger.retry_save() {
        debug!(error = %e, "Ledger still degraded");
    }
    let on_disk: BTreeSet<String> = disk.list_paths()?.into_iter().collect();
    let mut paths: BTreeSet<String> = store
        .list_all_paths_including_deleted()?
        .into_iter()
        .collect();
    paths.extend(on_disk.iter().cloned());

    let mut report = PassReport::new(PassKind::Flush);
    for path in paths {
        if disk.is_ignored(&path) {
            debug!(path = %path, "Entry matches an ignore pattern; left alone");
            report.record(path, PathOutcome::Unchanged);
            continue;
        }
        let present = on_disk.contains(&path);
        let outcome = match flush_path(store, ledger, disk, &path, present) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %path, error = %e, "Flush failed for path");
                PathOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.record(path, outcome);
    }

    store.flush()?;
    report.ledger_degraded = ledger.is_degraded();
    let summary = report.summary();
    info!(
        written = summary.written,
        deleted = summary.deleted,
        resurrected = summary.resurrected,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "Flush complete"
    );
    Ok(report)
}

fn flush_path(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
    path: &str,
    present: bool,
) -> Result<PathOutcome, ApiError> {
    let entry = store.get_entry(path)?;
    let tracking = Tracking::of(entry.as_ref());
    let action = flush_action(tracking, ledger.acknowledgement(path), present);
    debug!(path = %path, tracking = ?tracking, on_disk = present, action = ?action, "Flush decision");

    match (action, entry) {
        (FlushAction::Delete, _) => delete(store, ledger, disk, path, present),
        (FlushAction::Resurrect, _) => resurrect(store, ledger, disk, path),
        (FlushAction::Materialize, Some(entry)) => {
            disk.write(path, &entry.content)?;
            store.record_materialized(path, entry.content_hash())?;
            note_ledger_result(path, ledger.add(path));
            Ok(PathOutcome::Written)
        }
        (FlushAction::Refresh, Some(entry)) => refresh(store, ledger, disk, &entry),
        (FlushAction::NoOp, _) | (FlushAction::Materialize | FlushAction::Refresh, None) => {
            Ok(PathOutcome::Unchanged)
        }
    }
}

fn delete(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
    path: &str,
    present: bool,
) -> Result<PathOutcome, ApiError> {
    let outcome = if present {
        match disk.delete(path) {
            Ok(()) => PathOutcome::Deleted,
            Err(e) if e.is_not_found() => PathOutcome::Unchanged,
            Err(e) => return Err(e.into()),
        }
    } else {
        PathOutcome::Unchanged
    };
    store.forget_materialized(path)?;
    note_ledger_result(path, ledger.remove(path));
    Ok(outcome)
}

fn resurrect(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
    path: &str,
) -> Result<PathOutcome, ApiError> {
    let content = match disk.read(path) {
        Ok(content) => content,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let hash = content_hash(&content);
    store.add_file(path, content)?;
    store.record_materialized(path, hash)?;
    note_ledger_result(path, ledger.add(path));
    Ok(PathOutcome::Resurrected)
}

/// Whole-file replace when the store's content reference differs from the
/// last one materialized on this machine. Local edits to the file are left
/// alone until the document itself moves. With no record at all the disk
/// bytes stand in for it.
fn refresh(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
    entry: &FileEntry,
) -> Result<PathOutcome, ApiError> {
    let path = entry.path.as_str();
    let wanted = entry.content_hash();
    let recorded = store.materialized(path)?;
    let current = match recorded {
        Some(hash) => Some(hash),
        None => match disk.read(path) {
            Ok(bytes) => Some(content_hash(&bytes)),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        },
    };

    let outcome = if current == Some(wanted) {
        PathOutcome::Unchanged
    } else {
        debug!(
            path = %path,
            from = ?current.as_ref().map(short_hex),
            to = %short_hex(&wanted),
            "Refreshing stale disk copy"
        );
        disk.write(path, &entry.content)?;
        PathOutcome::Written
    };
    if recorded != Some(wanted) {
        store.record_materialized(path, wanted)?;
    }
    note_ledger_result(path, ledger.add(path));
    Ok(outcome)
}
