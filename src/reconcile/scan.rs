//! scan(): disk to Structure Store

use super::decision::{scan_action, ScanAction, Tracking};
use super::note_ledger_result;
use super::outcome::{PassKind, PassReport, PathOutcome};
use crate::document::StructureStore;
use crate::error::ApiError;
use crate::ledger::KnownPathsLedger;
use crate::tree::Disk;
use crate::types::content_hash;
use tracing::{debug, info, warn};

/// Bring every file on disk into the store.
///
/// Fails as a whole only when the disk cannot be listed; any other problem
/// is recorded as a failed path and the pass moves on.
pub fn run(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
) -> Result<PassReport, ApiError> {
    if let Err(e) = ledger.retry_save() {
        debug!(error = %e, "Ledger still degraded");
    }
    let paths = disk.list_paths()?;
    let mut report = PassReport::new(PassKind::Scan);

    for path in paths {
        let outcome = match scan_path(store, ledger, disk, &path) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %path, error = %e, "Scan failed for path");
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
        imported = summary.imported,
        resurrected = summary.resurrected,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "Scan complete"
    );
    Ok(report)
}

fn scan_path(
    store: &mut StructureStore,
    ledger: &mut KnownPathsLedger,
    disk: &dyn Disk,
    path: &str,
) -> Result<PathOutcome, ApiError> {
    let tracking = Tracking::of(store.get_entry(path)?.as_ref());
    let action = scan_action(tracking, ledger.acknowledgement(path));
    debug!(path = %path, tracking = ?tracking, action = ?action, "Scan decision");

    let outcome = match action {
        ScanAction::NoOp => return Ok(PathOutcome::Unchanged),
        ScanAction::Import => PathOutcome::Imported,
        ScanAction::Resurrect => PathOutcome::Resurrected,
    };

    let content = match disk.read(path) {
        Ok(content) => content,
        // Gone since listing; nothing left to bring in.
        Err(e) if e.is_not_found() => return Ok(PathOutcome::Unchanged),
        Err(e) => return Err(e.into()),
    };
    let hash = content_hash(&content);
    store.add_file(path, content)?;
    store.record_materialized(path, hash)?;
    note_ledger_result(path, ledger.add(path));
    Ok(outcome)
}
