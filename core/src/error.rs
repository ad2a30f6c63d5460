//! Error types for range-harvest-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::traits::QueryError;
use crate::worker::RateLimitError;

/// Engine error type
///
/// Per-range query failures never surface here: they are retried and, once
/// exhausted, reported through the error collector. Only conditions that stop
/// the whole run are represented.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required builder component was not provided
    #[error("missing required component: {0}")]
    MissingConfig(&'static str),

    /// The preliminary estimate query exhausted its retries
    #[error("preliminary estimate failed after {attempts} attempts: {source}")]
    Startup {
        /// Number of queries issued
        attempts: u32,
        /// Last query error
        #[source]
        source: QueryError,
    },

    /// The rate limiter refused a token
    #[error("rate limiter error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// The task queue receiver is gone
    #[error("task queue closed")]
    QueueClosed,

    /// A collector stopped accepting items
    #[error("collector '{0}' closed")]
    CollectorClosed(&'static str),

    /// Lifecycle failure in the orchestrator
    #[error("orchestration error: {0}")]
    Orchestration(String),
}

impl HarvestError {
    /// Missing builder component
    pub fn missing_config(name: &'static str) -> Self {
        Self::MissingConfig(name)
    }

    /// Orchestration failure with a message
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::Orchestration(message.into())
    }

    /// Whether this error was caused by teardown rather than a fault
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            Self::RateLimit(RateLimitError::Closed) | Self::QueueClosed | Self::CollectorClosed(_)
        )
    }
}

/// Result type alias
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;
