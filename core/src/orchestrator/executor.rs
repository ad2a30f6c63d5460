//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};

use crate::channel::ChannelConfig;
use crate::collector::Collector;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::queue::TaskQueue;
use crate::range::PriceRange;
use crate::record::{FailedRange, Product};
use crate::traits::RangeQueryClient;
use crate::worker::{DecisionPolicy, TokenBucket, WorkerBuilder, WorkerStats};

use super::aggregator::aggregate_worker_stats;
use super::outcome::HarvestOutcome;
use super::seeding::initial_partition;

/// Why the orchestrator stopped waiting on the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Idle,
    Interrupted,
    WorkerFailed,
}

type WorkerExit = Result<(usize, HarvestResult<WorkerStats>), JoinError>;

/// Orchestrator manages the harvest lifecycle
///
/// Responsible for the preliminary estimate, seeding the queue, spawning
/// workers, detecting completion and tearing everything down in order.
/// An orchestrator runs once: teardown closes its token bucket.
pub struct Orchestrator {
    /// Harvest configuration
    pub(crate) config: HarvestConfig,

    /// Range query client (shared across workers)
    pub(crate) client: Arc<dyn RangeQueryClient>,

    /// Token bucket shared by the estimate and every worker
    pub(crate) limiter: Arc<TokenBucket>,

    /// Collector channel sizes
    pub(crate) channel_config: ChannelConfig,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(
        config: HarvestConfig,
        client: Arc<dyn RangeQueryClient>,
        limiter: Arc<TokenBucket>,
        channel_config: ChannelConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            client,
            limiter,
            channel_config,
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Stop the harvest early
    ///
    /// In-flight queries finish; queued tasks are returned as unresolved.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get the harvest configuration
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Query the whole domain once to learn the catalog size
    ///
    /// Goes through the token bucket like every other query and is retried
    /// up to `max_attempts` times.
    pub async fn estimate_total(&self, domain: PriceRange) -> HarvestResult<usize> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            self.limiter.acquire().await?;

            match self.client.query(&domain).await {
                Ok(page) => {
                    // Services that omit the total still report the match count
                    let total = if page.total > 0 { page.total } else { page.count };
                    tracing::debug!(attempts, total, count = page.count, "Preliminary estimate");
                    return Ok(total);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempts,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Preliminary estimate query failed"
                    );
                    if attempts >= self.config.max_attempts {
                        return Err(HarvestError::Startup { attempts, source: e });
                    }
                }
            }
        }
    }

    /// Run the harvest
    ///
    /// Returns once every task is resolved, or early with `interrupted` set
    /// when shutdown is requested. A worker that dies mid-run ends the harvest
    /// with an orchestration error.
    pub async fn run(&self) -> HarvestResult<HarvestOutcome> {
        let started_at = Utc::now();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        self.config.validate()?;
        let domain = self.config.domain()?;

        tracing::info!(
            client = self.client.name(),
            domain = %domain,
            page_cap = self.config.page_cap,
            workers = self.config.worker_count,
            bucket_capacity = self.config.bucket_capacity,
            refill_interval_ms = self.config.refill_interval_ms,
            "Starting harvest"
        );

        let estimated_total = self.estimate_total(domain).await?;
        let seeds = initial_partition(domain, estimated_total, self.config.page_cap);
        let seeded = seeds.len();

        let queue = Arc::new(TaskQueue::new());
        for task in seeds {
            queue.push(task)?;
        }
        tracing::info!(estimated_total, seeded, "Seeded task queue");

        let records = Collector::<Product>::spawn("records", self.channel_config.record_buffer);
        let failures =
            Collector::<FailedRange>::spawn("failures", self.channel_config.failure_buffer);
        let policy = DecisionPolicy::from(&self.config);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.worker_count {
            let worker = WorkerBuilder::new(worker_id)
                .client(Arc::clone(&self.client))
                .queue(Arc::clone(&queue))
                .limiter(Arc::clone(&self.limiter))
                .records_tx(records.sender())
                .failures_tx(failures.sender())
                .policy(policy)
                .build()?;
            let shutdown_rx = self.shutdown_tx.subscribe();

            workers.spawn(async move { (worker_id, worker.run(shutdown_rx).await) });
        }

        let mut results = Vec::with_capacity(self.config.worker_count);
        let mut worker_failures = 0;

        let stop = loop {
            tokio::select! {
                biased;

                _ = queue.wait_idle() => break Stop::Idle,

                _ = shutdown_rx.recv() => {
                    tracing::info!(
                        outstanding = queue.outstanding(),
                        "Shutdown requested, stopping harvest early"
                    );
                    break Stop::Interrupted;
                }

                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    // Workers only leave on their own after a fault, and a
                    // task lost with one can never be resolved
                    record_worker_exit(joined, &mut results, &mut worker_failures);
                    break Stop::WorkerFailed;
                }
            }
        };

        // Teardown: stop pulling, release token waiters, then join
        let _ = self.shutdown_tx.send(());
        self.limiter.close();
        while let Some(joined) = workers.join_next().await {
            record_worker_exit(joined, &mut results, &mut worker_failures);
        }

        let unresolved = queue.close_and_drain().await;
        let outstanding_at_close = queue.outstanding();
        if outstanding_at_close != unresolved.len() {
            tracing::warn!(
                outstanding = outstanding_at_close,
                drained = unresolved.len(),
                "Outstanding count disagrees with drained queue"
            );
        }

        let records = records.finish().await?;
        let failures = failures.finish().await?;

        if stop == Stop::WorkerFailed {
            return Err(HarvestError::orchestration(format!(
                "{} of {} workers failed with {} tasks outstanding",
                worker_failures, self.config.worker_count, outstanding_at_close
            )));
        }

        let summary = aggregate_worker_stats(&results);
        let outcome = HarvestOutcome {
            records,
            failures,
            unresolved,
            estimated_total,
            seeded,
            interrupted: stop == Stop::Interrupted,
            outstanding_at_close,
            summary,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            elapsed_ms = outcome.elapsed().num_milliseconds(),
            records = outcome.records.len(),
            failures = outcome.failures.len(),
            unresolved = outcome.unresolved.len(),
            queries = outcome.summary.queries,
            splits = outcome.summary.splits,
            qps = outcome.summary.queries_per_second,
            interrupted = outcome.interrupted,
            "Harvest finished"
        );

        Ok(outcome)
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Automatically triggers graceful shutdown on Ctrl+C.
    pub async fn run_with_signal_handling(&self) -> HarvestResult<HarvestOutcome> {
        let shutdown_tx = self.shutdown_tx.clone();

        // Spawn signal handler task
        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run().await;

        signal_handle.abort();

        result
    }

    /// Run with a timeout
    ///
    /// Automatically triggers shutdown when timeout is reached.
    pub async fn run_with_timeout(&self, timeout: Duration) -> HarvestResult<HarvestOutcome> {
        let shutdown_tx = self.shutdown_tx.clone();

        // Spawn timeout task
        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!("Timeout reached, initiating shutdown...");
            let _ = shutdown_tx.send(());
        });

        let result = self.run().await;

        timeout_handle.abort();

        result
    }
}

fn record_worker_exit(joined: WorkerExit, results: &mut Vec<WorkerStats>, failures: &mut usize) {
    match joined {
        Ok((worker_id, Ok(stats))) => {
            tracing::debug!(
                worker_id,
                queries = stats.queries,
                accepted = stats.accepted,
                splits = stats.splits,
                "Worker completed"
            );
            results.push(stats);
        }
        Ok((worker_id, Err(e))) => {
            *failures += 1;
            tracing::error!(worker_id, error = %e, "Worker returned error");
        }
        Err(e) => {
            *failures += 1;
            tracing::error!(error = %e, "Worker task panicked");
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("client", &self.client.name())
            .field("limiter", &self.limiter)
            .finish()
    }
}
