//! Worker statistics tracking

use std::time::Instant;

/// Statistics tracked by each worker
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Queries issued (successful or not)
    pub queries: usize,

    /// Queries that returned an error
    pub query_errors: usize,

    /// Ranges accepted with an exhaustive page
    pub accepted: usize,

    /// Ranges split into two halves
    pub splits: usize,

    /// Ranges requeued after a failed query
    pub retries: usize,

    /// Ranges reported as permanently failed
    pub failures: usize,

    /// Records handed to the record collector
    pub records: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Ranges that reached a final state on this worker
    pub fn resolved(&self) -> usize {
        self.accepted + self.splits + self.retries + self.failures
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Queries per second over the worker's lifetime
    pub fn queries_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.queries as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Record the outcome of one query
    pub fn record_query(&mut self, ok: bool) {
        self.queries += 1;
        if !ok {
            self.query_errors += 1;
        }
    }

    /// Record an accepted range and its records
    pub fn record_accept(&mut self, records: usize) {
        self.accepted += 1;
        self.records += records;
    }

    /// Record a split
    pub fn record_split(&mut self) {
        self.splits += 1;
    }

    /// Record a requeue after failure
    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Record a permanent failure
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge stats from another worker
    pub fn merge(&mut self, other: &WorkerStats) {
        self.queries += other.queries;
        self.query_errors += other.query_errors;
        self.accepted += other.accepted;
        self.splits += other.splits;
        self.retries += other.retries;
        self.failures += other.failures;
        self.records += other.records;
    }
}
