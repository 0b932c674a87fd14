//! Per-path results of a reconciliation pass

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Scan,
    Flush,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::Scan => write!(f, "scan"),
            PassKind::Flush => write!(f, "flush"),
        }
    }
}

/// What a pass did to one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PathOutcome {
    Imported,
    Written,
    Deleted,
    Resurrected,
    Unchanged,
    Failed { reason: String },
}

impl PathOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, PathOutcome::Unchanged | PathOutcome::Failed { .. })
    }
}

/// Outcome counts for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub imported: usize,
    pub written: usize,
    pub deleted: usize,
    pub resurrected: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub kind: PassKind,
    pub outcomes: BTreeMap<String, PathOutcome>,
    /// The ledger could not be persisted; tombstone decisions treat every path as new
    pub ledger_degraded: bool,
}

impl PassReport {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            outcomes: BTreeMap::new(),
            ledger_degraded: false,
        }
    }

    pub fn record(&mut self, path: impl Into<String>, outcome: PathOutcome) {
        self.outcomes.insert(path.into(), outcome);
    }

    pub fn outcome(&self, path: &str) -> Option<&PathOutcome> {
        self.outcomes.get(path)
    }

    pub fn summary(&self) -> PassSummary {
        let mut summary = PassSummary::default();
        for outcome in self.outcomes.values() {
            match outcome {
                PathOutcome::Imported => summary.imported += 1,
                PathOutcome::Written => summary.written += 1,
                PathOutcome::Deleted => summary.deleted += 1,
                PathOutcome::Resurrected => summary.resurrected += 1,
                PathOutcome::Unchanged => summary.unchanged += 1,
                PathOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// True when the pass changed neither disk nor store
    pub fn is_quiescent(&self) -> bool {
        self.outcomes.values().all(|o| !o.is_change())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(path, outcome)| match outcome {
            PathOutcome::Failed { reason } => Some((path.as_str(), reason.as_str())),
            _ => None,
        })
    }
}
