//! zone_check library: DNS zone consistency checking.
//!
//! Queries every nameserver that is supposed to be authoritative for a zone,
//! compares the answers against the configured records and against each
//! other, and streams a CSV report of records that are served
//! inconsistently. Each invocation is a fresh, stateless pass over the zone.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use zone_check::{run_check, Opt};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let opt = Opt::parse_from([
//!     "zone_check",
//!     "--config-file",
//!     "dns.toml",
//!     "--zone",
//!     "example.com.",
//! ]);
//! let report = run_check(&opt).await?;
//! println!(
//!     "{} of {} records inconsistent",
//!     report.failed_records, report.total_records
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod answer;
pub mod check;
pub mod config;
pub mod error;
pub mod initialization;
pub mod report;
pub mod resolver;
pub mod zone;

// Re-export public API
pub use answer::{Answer, Outcome};
pub use check::{dispatch, Verdict};
pub use config::{LogFormat, LogLevel, Opt};
pub use error::{CheckError, ErrorKind, QueryStats};
pub use run::{run_check, CheckReport};
pub use zone::{canonical_zone, Record, RecordType, ZoneSetConfig};

// Internal run module (contains the main checking logic)
mod run {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use futures::StreamExt;
    use log::info;

    use crate::check::dispatch;
    use crate::config::Opt;
    use crate::error::QueryStats;
    use crate::report::{write_header, write_record};
    use crate::resolver::configure_resolvers;
    use crate::zone::{canonical_zone, ZoneSetConfig};

    /// Summary of a completed check run.
    #[derive(Debug, Clone)]
    pub struct CheckReport {
        /// Canonical names of the zones that were checked.
        pub zones: Vec<String>,
        /// Number of records queried and scored.
        pub total_records: usize,
        /// Number of records whose verdict was not fully consistent.
        pub failed_records: usize,
        /// Elapsed time in seconds.
        pub elapsed_seconds: f64,
    }

    /// Runs the consistency check for every requested zone.
    ///
    /// This is the main entry point for the library. The report is streamed
    /// to stdout while queries are in flight; record-level failures show up
    /// in `failed_records`, never as an `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error for setup problems (unreadable configuration,
    /// undefined zone or source, unresolvable nameserver) and for
    /// unclassified transport failures mid-run. Report lines already
    /// streamed stay on stdout; no further records are queried.
    pub async fn run_check(opt: &Opt) -> Result<CheckReport> {
        let config = ZoneSetConfig::load(&opt.config_file)
            .context("failed to load zone configuration")?;

        let start_time = std::time::Instant::now();
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        let mut zones = Vec::with_capacity(opt.zones.len());
        let mut total_records = 0;
        let mut failed_records = 0;

        for zone in &opt.zones {
            let zone = canonical_zone(zone);
            writeln!(out, "Checking records for {zone}")?;

            let records = config.populate(&zone)?;
            info!("{} records configured for {zone}", records.len());

            let nameservers = if opt.nameservers.is_empty() {
                config.nameservers(&zone)?
            } else {
                opt.nameservers.clone()
            };
            let resolvers = configure_resolvers(
                &nameservers,
                Duration::from_secs(opt.timeout_secs),
                opt.workers,
            )
            .await?;

            write_header(&mut out, &nameservers)?;

            let stats = Arc::new(QueryStats::new());
            let mut verdicts = dispatch(records, &resolvers, Arc::clone(&stats));
            while let Some(verdict) = verdicts.next().await {
                let verdict = verdict?;
                write_record(&mut out, &verdict)?;
                total_records += 1;
                if !verdict.consistent() {
                    failed_records += 1;
                }
            }

            info!("{zone}: {}", stats.summary());
            zones.push(zone);
        }

        Ok(CheckReport {
            zones,
            total_records,
            failed_records,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
