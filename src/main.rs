//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `zone_check` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Exit-status mapping
//!
//! All core functionality is implemented in the library crate.

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use zone_check::initialization::init_logger_with;
use zone_check::{run_check, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    // Initialize logger based on config
    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_check(&opt).await {
        Ok(report) => {
            println!(
                "Checked {} record{} across {} zone{} in {:.1}s ({} inconsistent)",
                report.total_records,
                if report.total_records == 1 { "" } else { "s" },
                report.zones.len(),
                if report.zones.len() == 1 { "" } else { "s" },
                report.elapsed_seconds,
                report.failed_records
            );
            if report.failed_records > 0 {
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("zone_check error: {e:#}");
            process::exit(2);
        }
    }
}
