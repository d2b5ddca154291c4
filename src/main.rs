//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `domain_trace` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - A one-line summary of the run
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use domain_trace::initialization::init_logger_with;
use domain_trace::{run_resolution, Config, Opt, RunMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config: Config = Opt::parse().into();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    match run_resolution(config).await {
        Ok(report) => {
            let verb = match report.mode {
                RunMode::Resolve => "Resolved",
                RunMode::Trace => "Traced",
            };
            println!(
                "✅ {} {} domain{} ({} succeeded, {} failed, {} skipped inputs) in {:.1}s",
                verb,
                report.total_domains,
                if report.total_domains == 1 { "" } else { "s" },
                report.successful,
                report.failed,
                report.skipped_inputs,
                report.elapsed_seconds
            );
            if let Some(stats) = report.chain_stats {
                println!("Chain health score: {:.1}/100", stats.health_score);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("domain_trace error: {:#}", e);
            process::exit(1);
        }
    }
}
