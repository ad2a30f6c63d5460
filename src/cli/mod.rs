//! CLI argument parsing and command dispatch

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use range_harvest_core::HarvestConfig;

pub mod output;

pub use output::OutputFormat;

#[derive(Parser)]
#[command(name = "range-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest every record from a catalog endpoint
    Run(RunArgs),
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Catalog endpoint queried with minPrice/maxPrice
    #[arg(short, long, env = "RANGE_HARVEST_ENDPOINT")]
    pub endpoint: String,

    /// Lower bound of the price domain
    #[arg(long)]
    pub domain_low: Option<f64>,

    /// Upper bound of the price domain
    #[arg(long)]
    pub domain_high: Option<f64>,

    /// Most records the endpoint returns per query
    #[arg(long)]
    pub page_cap: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Retries allowed per range after a failed query
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Token bucket size
    #[arg(long)]
    pub bucket_capacity: Option<u32>,

    /// Milliseconds between token refills
    #[arg(long)]
    pub refill_ms: Option<u64>,

    /// Dense ranges narrower than this are reported instead of split
    #[arg(long)]
    pub min_width: Option<f64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Stop the harvest after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep records duplicated on split boundaries
    #[arg(long)]
    pub raw: bool,
}

impl RunArgs {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn harvest_config(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => HarvestConfig::default(),
        };

        if let Some(low) = self.domain_low {
            config.domain_low = low;
        }
        if let Some(high) = self.domain_high {
            config.domain_high = high;
        }
        if let Some(page_cap) = self.page_cap {
            config.page_cap = page_cap;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        if let Some(capacity) = self.bucket_capacity {
            config.bucket_capacity = capacity;
        }
        if let Some(refill) = self.refill_ms {
            config.refill_interval_ms = refill;
        }
        if let Some(width) = self.min_width {
            config.min_range_width = width;
        }

        config.validate().context("Invalid harvest configuration")?;
        Ok(config)
    }

    /// Overall deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
