// crates/sync-engine/src/result.rs
//! Outcome counts of a sync run

use serde::Serialize;
use std::fmt;

/// What a sync run changed
///
/// `added`, `updated`, `removed`, `unchanged` and `duplicate_keys` describe
/// the reconciliation. `uploaded`, `purged` and `degraded` are filled in by
/// the orchestrator for the pending-mutation push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Remote items inserted as new local records
    pub added: usize,
    /// Local records rewritten with changed remote data
    pub updated: usize,
    /// Local records dropped because the remote snapshot no longer has them
    pub removed: usize,
    /// Local records matched by the snapshot with nothing to change
    pub unchanged: usize,
    /// Keys that occurred more than once in the remote snapshot
    pub duplicate_keys: usize,
    /// Pending uploads confirmed as active
    pub uploaded: usize,
    /// Pending deletes physically removed
    pub purged: usize,
    /// The remote endpoint did not resolve and no pull happened
    pub degraded: bool,
}

impl SyncResult {
    /// Result of a run that reconciled nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of local writes made by reconciliation
    pub fn total_changes(&self) -> usize {
        self.added + self.updated + self.removed
    }

    /// True when neither reconciliation nor the push touched the store
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0 && self.uploaded == 0 && self.purged == 0
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} removed, {} unchanged, {} uploaded, {} purged",
            self.added, self.updated, self.removed, self.unchanged, self.uploaded, self.purged
        )?;
        if self.degraded {
            write!(f, " (offline)")?;
        }
        Ok(())
    }
}
