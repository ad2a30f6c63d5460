//! Builder pattern for Orchestrator construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::traits::RangeQueryClient;
use crate::worker::TokenBucket;

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .domain(0.0, 100_000.0)
///     .page_cap(1000)
///     .worker_count(10)
///     .token_bucket(10, Duration::from_millis(100))
///     .client(client)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: HarvestConfig,
    client: Option<Arc<dyn RangeQueryClient>>,
    channel_config: ChannelConfig,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
            client: None,
            channel_config: ChannelConfig::default(),
        }
    }

    /// Set the full harvest configuration
    pub fn config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the searched price domain
    pub fn domain(mut self, low: f64, high: f64) -> Self {
        self.config.domain_low = low;
        self.config.domain_high = high;
        self
    }

    /// Set the page cap
    pub fn page_cap(mut self, page_cap: usize) -> Self {
        self.config.page_cap = page_cap;
        self
    }

    /// Set the number of workers
    pub fn worker_count(mut self, workers: usize) -> Self {
        self.config.worker_count = workers;
        self
    }

    /// Set the per-range query budget
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the token bucket capacity and refill interval
    pub fn token_bucket(mut self, capacity: u32, refill: Duration) -> Self {
        self.config = self.config.with_token_bucket(capacity, refill);
        self
    }

    /// Set the narrowest range that may still be split
    pub fn min_range_width(mut self, width: f64) -> Self {
        self.config.min_range_width = width;
        self
    }

    /// Set the range query client
    pub fn client(mut self, client: Arc<dyn RangeQueryClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not set or if configuration
    /// validation fails.
    pub fn build(self) -> HarvestResult<Orchestrator> {
        let client = self
            .client
            .ok_or_else(|| HarvestError::missing_config("client"))?;

        self.config.validate()?;

        let limiter = TokenBucket::new(self.config.bucket_capacity, self.config.refill_interval())?;

        Ok(Orchestrator::new(
            self.config,
            client,
            Arc::new(limiter),
            self.channel_config,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
