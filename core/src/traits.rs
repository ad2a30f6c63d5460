//! Core trait for the catalog range query client
//!
//! The trait lives in core so the engine can be driven by any transport.
//! The HTTP implementation lives in the `range-harvest-client` crate.

use crate::range::PriceRange;
use crate::record::RangePage;
use async_trait::async_trait;
use std::time::Duration;

// ============================================================================
// Range Query Client Trait
// ============================================================================

/// Client issuing one "records priced within a range" query
///
/// Callers must acquire a rate limiter token before every call; the client
/// itself performs no throttling.
#[async_trait]
pub trait RangeQueryClient: Send + Sync {
    /// Client identifier for logs (e.g., "http", "mock")
    fn name(&self) -> &str;

    /// Query the catalog for records priced within `range`
    async fn query(&self, range: &PriceRange) -> Result<RangePage, QueryError>;
}

/// Query errors
///
/// The engine treats every variant as retryable; the split only exists for
/// logging and for transports that want to report detail.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// HTTP/network error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the catalog
    #[error("catalog returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Request timeout
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else the transport wants to report
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Decode(err.to_string())
    }
}
