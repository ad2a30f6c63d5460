//! Worker execution loop

use crate::error::{HarvestError, HarvestResult};
use crate::queue::TaskQueue;
use crate::range::RangeTask;
use crate::record::{FailedRange, Product};
use crate::traits::RangeQueryClient;

use super::decision::{decide, Decision, DecisionPolicy};
use super::rate_limiter::TokenBucket;
use super::stats::WorkerStats;

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Worker drains the task queue: pull -> acquire token -> query -> decide -> repeat
///
/// Workers are stateless tokio tasks managed by the Orchestrator. They share
/// the client, queue and token bucket via Arc and emit records and failed
/// ranges through the collectors' channels.
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// Range query client (shared across workers via Arc)
    client: Arc<dyn RangeQueryClient>,

    /// Task queue, drained and refilled by every worker
    queue: Arc<TaskQueue>,

    /// Token bucket every query must pass
    limiter: Arc<TokenBucket>,

    /// Channel sender for accepted records
    records_tx: mpsc::Sender<Product>,

    /// Channel sender for failed ranges
    failures_tx: mpsc::Sender<FailedRange>,

    /// Split/retry thresholds
    policy: DecisionPolicy,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        client: Arc<dyn RangeQueryClient>,
        queue: Arc<TaskQueue>,
        limiter: Arc<TokenBucket>,
        records_tx: mpsc::Sender<Product>,
        failures_tx: mpsc::Sender<FailedRange>,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            id,
            client,
            queue,
            limiter,
            records_tx,
            failures_tx,
            policy,
        }
    }

    /// Run the worker loop
    ///
    /// Returns WorkerStats once the shutdown signal arrives or the queue is
    /// closed. Shutdown only interrupts the wait for the next task; a task
    /// already pulled is carried to resolution, or handed back to the queue
    /// unqueried if the token bucket closes first.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> HarvestResult<WorkerStats> {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, "Worker started");

        loop {
            let task = tokio::select! {
                biased;

                // Check for shutdown signal (highest priority)
                _ = shutdown.recv() => {
                    tracing::debug!(worker_id = self.id, "Worker received shutdown signal");
                    break;
                }

                next = self.queue.next() => match next {
                    Some(task) => task,
                    None => {
                        tracing::debug!(worker_id = self.id, "Task queue closed, worker stopping");
                        break;
                    }
                },
            };

            let result = self.execute_one(task, &mut stats).await;
            self.queue.resolve();

            if let Err(e) = result {
                if e.is_shutdown() {
                    tracing::debug!(worker_id = self.id, error = %e, "Worker stopping on teardown");
                    break;
                }
                return Err(e);
            }
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            queries = stats.queries,
            accepted = stats.accepted,
            splits = stats.splits,
            failures = stats.failures,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        Ok(stats)
    }

    /// Query one range and act on the decision
    ///
    /// Follow-up tasks are pushed here; the caller resolves `task` afterwards.
    async fn execute_one(&self, task: RangeTask, stats: &mut WorkerStats) -> HarvestResult<()> {
        // 1. Wait for a token; a closed bucket hands the task back unqueried
        if let Err(e) = self.limiter.acquire().await {
            tracing::debug!(
                worker_id = self.id,
                range = %task.range,
                error = %e,
                "Token refused, returning task to queue"
            );
            self.queue.push(task)?;
            return Err(e.into());
        }

        // 2. Query
        let outcome = self.client.query(&task.range).await;
        stats.record_query(outcome.is_ok());
        if let Err(ref e) = outcome {
            tracing::warn!(
                worker_id = self.id,
                range = %task.range,
                attempt = task.attempts + 1,
                error = %e,
                "Range query failed"
            );
        }

        // 3. Decide and emit
        match decide(task, outcome, &self.policy) {
            Decision::Accept(products) => {
                let count = products.len();
                for product in products {
                    self.records_tx
                        .send(product)
                        .await
                        .map_err(|_| HarvestError::CollectorClosed("records"))?;
                }
                stats.record_accept(count);
            }
            Decision::Split(left, right) => {
                tracing::debug!(
                    worker_id = self.id,
                    range = %task.range,
                    left = %left.range,
                    right = %right.range,
                    "Splitting dense range"
                );
                self.queue.push_split(left, right)?;
                stats.record_split();
            }
            Decision::Retry(retry) => {
                self.queue.push(retry)?;
                stats.record_retry();
            }
            Decision::Fail(failed) => {
                tracing::warn!(
                    worker_id = self.id,
                    range = %failed.range,
                    attempts = failed.attempts,
                    reason = ?failed.reason,
                    "Giving up on range"
                );
                self.failures_tx
                    .send(failed)
                    .await
                    .map_err(|_| HarvestError::CollectorClosed("failures"))?;
                stats.record_failure();
            }
        }

        Ok(())
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("client", &self.client.name())
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish()
    }
}
