//! range-harvest-core: Adaptive range-partitioning fetch engine
//!
//! Extracts every record from a catalog API that answers "records priced
//! within [low, high]" but returns at most one page per query. Dense ranges
//! are split in half until each page is exhaustive. This crate provides:
//!
//! - Range and record types
//! - The RangeQueryClient trait implemented by transports
//! - A shared token bucket, task queue and worker pool
//! - Record and failure collectors
//! - The Orchestrator driving a complete harvest
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod collector;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod range;
pub mod record;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::ChannelConfig;
pub use collector::Collector;
pub use config::{ConfigError, HarvestConfig};
pub use error::*;
pub use orchestrator::{HarvestOutcome, HarvestSummary, Orchestrator, OrchestratorBuilder};
pub use queue::{TaskQueue, WorkTracker};
pub use range::{PriceRange, RangeError, RangeTask};
pub use record::{FailedRange, FailureReason, Product, RangePage};
pub use traits::*;
pub use worker::{RateLimitError, TokenBucket, Worker, WorkerBuilder, WorkerStats};
