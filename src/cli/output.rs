//! Printing harvest results

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use range_harvest_core::{FailedRange, FailureReason, HarvestOutcome, Product, RangeTask};

/// Result output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Tab-separated records and plain failure lines
    Text,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    Record(&'a Product),
    Failure(&'a FailedRange),
    Unresolved(&'a RangeTask),
}

/// Write records, then failures, then unresolved tasks
pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &HarvestOutcome,
    format: OutputFormat,
    raw: bool,
) -> Result<()> {
    let distinct;
    let records: &[Product] = if raw {
        &outcome.records
    } else {
        distinct = outcome.distinct_records();
        &distinct
    };

    match format {
        OutputFormat::Json => {
            let lines = records
                .iter()
                .map(Line::Record)
                .chain(outcome.failures.iter().map(Line::Failure))
                .chain(outcome.unresolved.iter().map(Line::Unresolved));
            for line in lines {
                serde_json::to_writer(&mut *out, &line)?;
                writeln!(out)?;
            }
        }
        OutputFormat::Text => {
            for p in records {
                writeln!(out, "{}\t{}\t{}", p.id, p.price, p.name)?;
            }
            for f in &outcome.failures {
                let reason = match &f.reason {
                    FailureReason::QueryFailed { error } => format!("query failed: {}", error),
                    FailureReason::TooDense { count } => {
                        format!("too dense: {} matches", count)
                    }
                };
                writeln!(out, "FAILED {} after {} queries, {}", f.range, f.attempts, reason)?;
            }
            for t in &outcome.unresolved {
                writeln!(out, "UNRESOLVED {}", t.range)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
