//! Builder pattern for Worker construction

use crate::error::{HarvestError, HarvestResult};
use crate::queue::TaskQueue;
use crate::record::{FailedRange, Product};
use crate::traits::RangeQueryClient;

use super::decision::DecisionPolicy;
use super::executor::Worker;
use super::rate_limiter::TokenBucket;

use std::sync::Arc;
use tokio::sync::mpsc;

/// Builder for creating Worker instances
///
/// Provides ergonomic construction with validation.
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .client(client)
///     .queue(queue)
///     .limiter(bucket)
///     .records_tx(records.sender())
///     .failures_tx(failures.sender())
///     .policy(DecisionPolicy::default())
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    client: Option<Arc<dyn RangeQueryClient>>,
    queue: Option<Arc<TaskQueue>>,
    limiter: Option<Arc<TokenBucket>>,
    records_tx: Option<mpsc::Sender<Product>>,
    failures_tx: Option<mpsc::Sender<FailedRange>>,
    policy: DecisionPolicy,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            client: None,
            queue: None,
            limiter: None,
            records_tx: None,
            failures_tx: None,
            policy: DecisionPolicy::default(),
        }
    }

    /// Set the range query client
    pub fn client(mut self, client: Arc<dyn RangeQueryClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the shared task queue
    pub fn queue(mut self, queue: Arc<TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set the shared token bucket
    pub fn limiter(mut self, limiter: Arc<TokenBucket>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Set the record channel sender
    pub fn records_tx(mut self, tx: mpsc::Sender<Product>) -> Self {
        self.records_tx = Some(tx);
        self
    }

    /// Set the failed range channel sender
    pub fn failures_tx(mut self, tx: mpsc::Sender<FailedRange>) -> Self {
        self.failures_tx = Some(tx);
        self
    }

    /// Set the decision policy
    pub fn policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> HarvestResult<Worker> {
        let client = self.client.ok_or(HarvestError::missing_config("client"))?;
        let queue = self.queue.ok_or(HarvestError::missing_config("queue"))?;
        let limiter = self
            .limiter
            .ok_or(HarvestError::missing_config("limiter"))?;
        let records_tx = self
            .records_tx
            .ok_or(HarvestError::missing_config("records_tx"))?;
        let failures_tx = self
            .failures_tx
            .ok_or(HarvestError::missing_config("failures_tx"))?;

        Ok(Worker::new(
            self.id,
            client,
            queue,
            limiter,
            records_tx,
            failures_tx,
            self.policy,
        ))
    }
}
