//! Error taxonomy and per-run query statistics.
//!
//! Two layers of failure exist. [`ErrorKind`] covers the recoverable,
//! per-query failure modes that become part of a record's verdict; the run
//! keeps going. [`CheckError`] covers everything fatal: configuration
//! problems discovered before dispatch, and transport failures the
//! normalizer cannot classify (absorbing those could report false
//! consistency).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use hickory_resolver::error::ResolveError;
use log::SetLoggerError;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Fatal errors that abort a check run.
///
/// Setup-level variants are raised before any query is issued; `Transport`
/// is raised mid-run and stops the remaining records, leaving the lines
/// already streamed untouched.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A configuration or record-source file could not be read.
    #[error("failed to read {path}: {source}")]
    ConfigRead {
        /// Path of the unreadable file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration or record-source file is not valid TOML.
    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        /// Path of the invalid file.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The requested zone has no entry in the configuration file.
    #[error("zone {0} is not defined in the configuration")]
    UnknownZone(String),

    /// A zone lists a record source that is not defined.
    #[error("zone {zone} references unknown source {source_name}")]
    UnknownSource {
        /// The zone naming the source.
        zone: String,
        /// The undefined source name.
        source_name: String,
    },

    /// A record source has a `type` no provider implements.
    #[error("source {source_name} has unsupported type {kind:?}")]
    UnknownSourceKind {
        /// The offending source name.
        source_name: String,
        /// Its configured `type` value.
        kind: String,
    },

    /// A `file` source is missing its `path`.
    #[error("source {source_name} has type \"file\" but no path")]
    SourceMissingPath {
        /// The offending source name.
        source_name: String,
    },

    /// A non-NS record was configured without values.
    #[error("record {fqdn} ({rtype}) has no configured values")]
    EmptyRecord {
        /// The record's fully-qualified name.
        fqdn: String,
        /// The record's type mnemonic.
        rtype: String,
    },

    /// No nameservers are configured for a zone and none were given on the
    /// command line.
    #[error("zone {zone} has no nameservers configured")]
    NoNameservers {
        /// The zone without nameservers.
        zone: String,
    },

    /// A nameserver identifier given as a hostname did not resolve.
    #[error("could not resolve nameserver {host}: {reason}")]
    NameserverResolution {
        /// The configured nameserver identifier.
        host: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A resolver error outside the closed recoverable taxonomy.
    #[error("transport failure querying {server} for {fqdn} {rtype}: {source}")]
    Transport {
        /// The nameserver that was being queried.
        server: String,
        /// The record's fully-qualified name.
        fqdn: String,
        /// The record's type mnemonic.
        rtype: String,
        /// The unclassified resolver error.
        #[source]
        source: ResolveError,
    },
}

/// Recoverable per-query failure modes.
///
/// These are scored as mismatches in a record's verdict but never abort the
/// run. The set is closed on purpose: anything a resolver reports outside it
/// is promoted to [`CheckError::Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    /// No response before the resolver timeout elapsed.
    Timeout,
    /// The queried name does not exist (NXDOMAIN).
    NotFound,
    /// The server responded but carried no data for the queried type.
    NoAnswer,
}

impl ErrorKind {
    /// Marker text used in report fields and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::NotFound => "NXDOMAIN",
            ErrorKind::NoAnswer => "NOANSWER",
        }
    }
}

/// Thread-safe per-kind query failure counters.
///
/// Tracks how many queries failed with each [`ErrorKind`] plus how many NS
/// queries were skipped, using atomic counters so concurrent query groups can
/// record without locking. All kinds are initialized to zero on creation.
pub struct QueryStats {
    counts: HashMap<ErrorKind, AtomicUsize>,
    skipped: AtomicUsize,
}

impl QueryStats {
    /// Creates a tracker with every kind zeroed.
    pub fn new() -> Self {
        let mut counts = HashMap::new();
        for kind in ErrorKind::iter() {
            counts.insert(kind, AtomicUsize::new(0));
        }
        QueryStats {
            counts,
            skipped: AtomicUsize::new(0),
        }
    }

    /// Records one failed query.
    pub fn increment(&self, kind: ErrorKind) {
        // All kinds are initialized in new(), so the lookup cannot miss.
        self.counts
            .get(&kind)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for one failure kind.
    pub fn get_count(&self, kind: ErrorKind) -> usize {
        self.counts.get(&kind).unwrap().load(Ordering::SeqCst)
    }

    /// Records one skipped NS query.
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of NS queries that were skipped rather than scored.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// One-line summary for the end-of-zone log message.
    pub fn summary(&self) -> String {
        format!(
            "timeouts={} nxdomain={} no-answer={} ns-skipped={}",
            self.get_count(ErrorKind::Timeout),
            self.get_count(ErrorKind::NotFound),
            self.get_count(ErrorKind::NoAnswer),
            self.skipped(),
        )
    }
}
