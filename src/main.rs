//! range-harvest - Adaptive range-partitioning bulk extractor

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use range_harvest_client::{CatalogClient, HttpConfig};
use range_harvest_core::{HarvestConfig, OrchestratorBuilder};

mod cli;

use cli::{Cli, Commands, RunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; results go to stdout, logs to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Validate { config } => {
            let config = HarvestConfig::from_json_file(&config)
                .with_context(|| format!("Failed to load config from {}", config.display()))?;
            config.validate().context("Invalid harvest configuration")?;
            tracing::info!(?config, "Configuration is valid");
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.harvest_config()?;

    let http = HttpConfig::default()
        .with_request_timeout(Duration::from_secs(args.request_timeout_secs))
        .with_pool_max_idle(config.worker_count);
    let client = CatalogClient::new(&args.endpoint, &http)
        .with_context(|| format!("Failed to create client for {}", args.endpoint))?;

    let orchestrator = OrchestratorBuilder::new()
        .config(config)
        .client(Arc::new(client))
        .build()
        .context("Failed to build orchestrator")?;

    let outcome = match args.timeout() {
        Some(timeout) => orchestrator.run_with_timeout(timeout).await,
        None => orchestrator.run_with_signal_handling().await,
    }
    .context("Harvest failed")?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    cli::output::write_outcome(&mut out, &outcome, args.format, args.raw)
        .context("Failed to write results")?;

    tracing::info!(
        estimated_total = outcome.estimated_total,
        records = outcome.records.len(),
        distinct = outcome.distinct_records().len(),
        failures = outcome.failures.len(),
        unresolved = outcome.unresolved.len(),
        queries = outcome.summary.queries,
        error_rate = outcome.summary.error_rate(),
        elapsed_ms = outcome.elapsed().num_milliseconds(),
        "Harvest summary"
    );

    if !outcome.is_complete() {
        tracing::warn!("Harvest incomplete: some ranges were not collected");
    }

    Ok(())
}
