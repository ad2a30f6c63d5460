//! Harvest configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::range::PriceRange;

/// Harvest configuration
///
/// Defines the search domain, the page cap that decides when a range must be
/// split, the size of the worker pool, the retry budget and the token bucket
/// shared by every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Lower bound of the searched price domain
    pub domain_low: f64,

    /// Upper bound of the searched price domain
    pub domain_high: f64,

    /// Most records the catalog returns for one query
    pub page_cap: usize,

    /// Number of concurrent worker tasks
    pub worker_count: usize,

    /// Retries allowed per range after its first failed query
    pub max_attempts: u32,

    /// Token bucket size (burst of queries)
    pub bucket_capacity: u32,

    /// One token is returned to the bucket per interval
    pub refill_interval_ms: u64,

    /// Dense ranges narrower than this are failed instead of split
    pub min_range_width: f64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            domain_low: 0.0,
            domain_high: 100_000.0,
            page_cap: 1000,
            worker_count: 10,
            max_attempts: 3,
            bucket_capacity: 10,
            refill_interval_ms: 100,
            min_range_width: 0.01,
        }
    }
}

impl HarvestConfig {
    /// Create a new config covering `[low, high]`
    pub fn new(domain_low: f64, domain_high: f64) -> Self {
        Self {
            domain_low,
            domain_high,
            ..Default::default()
        }
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the page cap
    pub fn with_page_cap(mut self, page_cap: usize) -> Self {
        self.page_cap = page_cap;
        self
    }

    /// Set the worker count
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the per-range attempt budget
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the token bucket capacity and refill interval
    pub fn with_token_bucket(mut self, capacity: u32, refill: Duration) -> Self {
        self.bucket_capacity = capacity;
        self.refill_interval_ms = refill.as_millis() as u64;
        self
    }

    /// Set the split floor
    pub fn with_min_range_width(mut self, width: f64) -> Self {
        self.min_range_width = width;
        self
    }

    /// Refill interval as a [`Duration`]
    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms)
    }

    /// The full search domain
    pub fn domain(&self) -> Result<PriceRange, ConfigError> {
        PriceRange::new(self.domain_low, self.domain_high)
            .map_err(|e| ConfigError::InvalidDomain(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain = self.domain()?;
        if domain.width() <= 0.0 {
            return Err(ConfigError::InvalidDomain(format!(
                "domain {} has no width",
                domain
            )));
        }

        if self.page_cap == 0 {
            return Err(ConfigError::InvalidPageCap(
                "page cap must be at least 1".into(),
            ));
        }

        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount(
                "worker count must be at least 1".into(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(
                "at least one attempt per range is required".into(),
            ));
        }

        if self.bucket_capacity == 0 {
            return Err(ConfigError::InvalidTokenBucket(
                "bucket capacity must be at least 1".into(),
            ));
        }

        if self.refill_interval_ms == 0 {
            return Err(ConfigError::InvalidTokenBucket(
                "refill interval must be positive".into(),
            ));
        }

        if !self.min_range_width.is_finite() || self.min_range_width <= 0.0 {
            return Err(ConfigError::InvalidMinRangeWidth(format!(
                "minimum range width must be positive, got {}",
                self.min_range_width
            )));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid search domain
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Invalid page cap
    #[error("Invalid page cap: {0}")]
    InvalidPageCap(String),

    /// Invalid worker count
    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(String),

    /// Invalid retry budget
    #[error("Invalid max attempts: {0}")]
    InvalidMaxAttempts(String),

    /// Invalid token bucket parameters
    #[error("Invalid token bucket: {0}")]
    InvalidTokenBucket(String),

    /// Invalid split floor
    #[error("Invalid minimum range width: {0}")]
    InvalidMinRangeWidth(String),

    /// Config file could not be read
    #[error("Cannot read config: {0}")]
    Io(String),

    /// Config file is not valid JSON
    #[error("Cannot parse config: {0}")]
    Parse(String),
}
