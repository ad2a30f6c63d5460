//! Worker module for draining the range task queue
//!
//! The Worker is the core execution unit of a harvest, responsible for the
//! simple loop: **pull -> acquire token -> query -> decide -> repeat**.
//!
//! Workers hold no per-range state of their own. Each Worker is a tokio task
//! that:
//!
//! 1. Pulls the next range task from the shared queue
//! 2. Waits for a token from the shared token bucket
//! 3. Queries the catalog through a RangeQueryClient
//! 4. Accepts, splits, retries or fails the range (see [`decide`])
//! 5. Pushes follow-up tasks before resolving the current one
//! 6. Repeats until the orchestrator broadcasts shutdown
//!
//! # Example
//!
//! ```ignore
//! use range_harvest_core::worker::{TokenBucket, WorkerBuilder};
//!
//! let worker = WorkerBuilder::new(0)
//!     .client(client)
//!     .queue(queue)
//!     .limiter(Arc::new(TokenBucket::new(10, Duration::from_millis(100))?))
//!     .records_tx(records.sender())
//!     .failures_tx(failures.sender())
//!     .build()?;
//!
//! let stats = worker.run(shutdown_rx).await?;
//! println!("Accepted: {}", stats.accepted);
//! ```

mod builder;
mod decision;
mod executor;
mod rate_limiter;
mod stats;

pub use builder::WorkerBuilder;
pub use decision::{decide, Decision, DecisionPolicy};
pub use executor::Worker;
pub use rate_limiter::{RateLimitError, TokenBucket};
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;
