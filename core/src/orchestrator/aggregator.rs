//! Statistics aggregation from multiple workers

use std::time::Duration;

use serde::Serialize;

use crate::worker::WorkerStats;

/// Aggregated statistics from all workers
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestSummary {
    /// Number of workers that returned stats
    pub total_workers: usize,

    /// Range queries issued
    pub queries: usize,

    /// Range queries that errored
    pub query_errors: usize,

    /// Ranges accepted
    pub accepted: usize,

    /// Ranges split
    pub splits: usize,

    /// Ranges requeued after an error
    pub retries: usize,

    /// Ranges reported as failed
    pub failures: usize,

    /// Records handed to the record collector
    pub records: usize,

    /// Maximum duration across all workers
    pub total_duration: Duration,

    /// Overall queries per second
    pub queries_per_second: f64,
}

impl HarvestSummary {
    /// Share of queries that errored (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.queries > 0 {
            self.query_errors as f64 / self.queries as f64
        } else {
            0.0
        }
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_worker_stats(stats: &[WorkerStats]) -> HarvestSummary {
    if stats.is_empty() {
        return HarvestSummary::default();
    }

    let mut total = WorkerStats::new();
    for s in stats {
        total.merge(s);
    }

    // Workers run concurrently: the slowest one bounds the run
    let total_duration = stats
        .iter()
        .filter_map(|s| s.elapsed())
        .max()
        .unwrap_or(Duration::ZERO);

    let secs = total_duration.as_secs_f64();
    let queries_per_second = if secs > 0.0 {
        total.queries as f64 / secs
    } else {
        0.0
    };

    HarvestSummary {
        total_workers: stats.len(),
        queries: total.queries,
        query_errors: total.query_errors,
        accepted: total.accepted,
        splits: total.splits,
        retries: total.retries,
        failures: total.failures,
        records: total.records,
        total_duration,
        queries_per_second,
    }
}
