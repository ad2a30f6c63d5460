//! Result of a harvest run

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::range::RangeTask;
use crate::record::{FailedRange, Product};

use super::aggregator::HarvestSummary;

/// Everything a harvest produced
#[derive(Debug, Clone, Serialize)]
pub struct HarvestOutcome {
    /// Accepted records in arrival order
    ///
    /// Adjacent ranges share their boundary, so a record priced exactly on a
    /// split point can appear twice. See [`HarvestOutcome::distinct_records`].
    pub records: Vec<Product>,

    /// Ranges that reached a terminal failure
    pub failures: Vec<FailedRange>,

    /// Tasks still queued when an interrupted run stopped
    pub unresolved: Vec<RangeTask>,

    /// Catalog size reported by the preliminary query
    pub estimated_total: usize,

    /// Seed tasks the domain was partitioned into
    pub seeded: usize,

    /// Whether the run was stopped before the queue went idle
    pub interrupted: bool,

    /// Tasks created but never resolved when the queue closed
    pub outstanding_at_close: usize,

    /// Aggregated worker statistics
    pub summary: HarvestSummary,

    /// Wall clock start
    pub started_at: DateTime<Utc>,

    /// Wall clock end
    pub finished_at: DateTime<Utc>,
}

impl HarvestOutcome {
    /// Whether every range was resolved without failure
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.failures.is_empty() && self.unresolved.is_empty()
    }

    /// Records with duplicate ids removed, first arrival kept
    pub fn distinct_records(&self) -> Vec<Product> {
        let mut seen = HashSet::with_capacity(self.records.len());
        self.records
            .iter()
            .filter(|p| seen.insert(p.id))
            .cloned()
            .collect()
    }

    /// Wall clock duration of the run
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
