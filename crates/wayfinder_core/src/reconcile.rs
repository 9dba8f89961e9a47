//! Outcome of a bulk reconcile pass.

use serde::{Deserialize, Serialize};

/// Row counts from one stage-then-merge pass.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct ReconcileSummary {
    /// Snapshot rows with no existing natural key match
    inserted: usize,
    /// Snapshot rows that matched an existing row
    updated: usize,
    /// Rows whose completion timestamp was stamped by this pass
    completed: usize,
}

impl ReconcileSummary {
    /// Create a summary from raw counts.
    pub fn new(inserted: usize, updated: usize, completed: usize) -> Self {
        Self {
            inserted,
            updated,
            completed,
        }
    }

    /// Total snapshot rows written.
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}
