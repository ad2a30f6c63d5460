//! Orchestrator for harvest lifecycle management
//!
//! The Orchestrator coordinates a complete harvest:
//! - Estimating the catalog size with one query over the whole domain
//! - Seeding the task queue with an equal-width partition
//! - Spawning and managing worker tasks
//! - Detecting completion through the outstanding-work counter
//! - Managing graceful shutdown via broadcast channels
//! - Closing the collectors and assembling the outcome
//!
//! # Example
//!
//! ```ignore
//! use range_harvest_core::OrchestratorBuilder;
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .domain(0.0, 100_000.0)
//!     .page_cap(1000)
//!     .worker_count(10)
//!     .client(client)
//!     .build()?;
//!
//! let outcome = orchestrator.run_with_signal_handling().await?;
//! ```

mod aggregator;
mod builder;
mod executor;
mod outcome;
mod seeding;

pub use aggregator::{aggregate_worker_stats, HarvestSummary};
pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;
pub use outcome::HarvestOutcome;
pub use seeding::{initial_partition, partition_count};
