//! Per-nameserver DNS clients with bounded concurrency.
//!
//! Each configured nameserver gets its own [`Resolver`]: a hickory client
//! pinned to that server plus a semaphore bounding in-flight queries, so one
//! stalled server cannot monopolize sockets or starve the others. Resolvers
//! share nothing; every (record, resolver) query is an independent future.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveError;
use hickory_resolver::lookup::Lookup;
use hickory_resolver::proto::rr::RecordType as WireRecordType;
use hickory_resolver::TokioAsyncResolver;
use log::info;
use tokio::sync::Semaphore;

use crate::config::{BOOTSTRAP_TIMEOUT_SECS, DNS_PORT};
use crate::error::CheckError;
use crate::zone::Record;

/// A DNS client bound to a single nameserver.
pub struct Resolver {
    name: String,
    address: IpAddr,
    inner: TokioAsyncResolver,
    workers: Semaphore,
}

impl Resolver {
    /// Builds a resolver that queries exactly one nameserver.
    ///
    /// The client is configured for a single attempt per query (failures are
    /// classified, never retried away), with no cache and no hosts file, so
    /// every query reflects what the server answers right now.
    pub fn new(name: String, address: IpAddr, timeout: Duration, workers: usize) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 0;
        opts.cache_size = 0;
        opts.use_hosts_file = false;
        opts.ndots = 0;
        let config = ResolverConfig::from_parts(
            None,
            Vec::new(),
            NameServerConfigGroup::from_ips_clear(&[address], DNS_PORT, true),
        );
        Resolver {
            name,
            address,
            inner: TokioAsyncResolver::tokio(config, opts),
            // a zero-permit pool would never issue a query
            workers: Semaphore::new(workers.max(1)),
        }
    }

    /// The nameserver identifier as configured (used for report columns).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved address queries are sent to.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Issues one query for `record` against this nameserver.
    ///
    /// Waits for a worker permit first; the resolver timeout covers only the
    /// wire query. A timeout or error here is terminal for this
    /// (record, resolver) pair.
    pub async fn query(&self, record: &Record) -> Result<Lookup, ResolveError> {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| ResolveError::from("resolver worker pool closed"))?;
        self.inner
            .lookup(record.fqdn.as_str(), WireRecordType::from(record.rtype))
            .await
    }
}

/// Builds one resolver per nameserver identifier, in configuration order.
///
/// Identifiers that are not IP literals are resolved once, up front, on the
/// default public resolver configuration.
///
/// # Errors
///
/// A nameserver that cannot be resolved aborts the run before any record
/// query is issued.
pub async fn configure_resolvers(
    servers: &[String],
    timeout: Duration,
    workers: usize,
) -> Result<Vec<Arc<Resolver>>, CheckError> {
    let mut resolvers = Vec::with_capacity(servers.len());
    for server in servers {
        let address = match server.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => resolve_nameserver(server).await?,
        };
        info!("server={address} ({server})");
        resolvers.push(Arc::new(Resolver::new(
            server.clone(),
            address,
            timeout,
            workers,
        )));
    }
    Ok(resolvers)
}

/// One-time forward lookup for a nameserver given as a hostname.
async fn resolve_nameserver(host: &str) -> Result<IpAddr, CheckError> {
    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(BOOTSTRAP_TIMEOUT_SECS);
    opts.ndots = 0;
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
    let response =
        resolver
            .lookup_ip(host)
            .await
            .map_err(|e| CheckError::NameserverResolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;
    response
        .iter()
        .next()
        .ok_or_else(|| CheckError::NameserverResolution {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        })
}
