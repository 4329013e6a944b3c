//! Application configuration and CLI options.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default per-query timeout for each nameserver, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
/// Default number of concurrent in-flight queries per nameserver.
pub const DEFAULT_WORKERS: usize = 4;
/// Port DNS queries are sent to.
pub const DNS_PORT: u16 = 53;
/// Timeout for the one-time forward lookup of a nameserver hostname.
pub const BOOTSTRAP_TIMEOUT_SECS: u64 = 5;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to
/// most verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// The report goes to stdout; logs go to stderr. All tuning options have
/// defaults matching the constants above.
///
/// # Examples
///
/// ```bash
/// # Check one zone against its configured nameservers
/// zone_check --config-file dns.toml --zone example.com.
///
/// # Check two zones against an explicit nameserver list
/// zone_check --config-file dns.toml --zone example.com. --zone example.org. \
///     --nameserver 10.0.0.53 --nameserver 10.0.1.53
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "zone_check",
    about = "Checks that every nameserver of a zone serves the configured records consistently."
)]
pub struct Opt {
    /// Zone configuration file to use
    #[arg(long, value_parser)]
    pub config_file: PathBuf,

    /// Zone to check (repeatable)
    #[arg(long = "zone", required = true)]
    pub zones: Vec<String>,

    /// Nameserver to query instead of the ones configured for the zone
    /// (repeatable)
    #[arg(long = "nameserver")]
    pub nameservers: Vec<String>,

    /// Per-nameserver query timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Concurrent in-flight queries per nameserver
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}
