use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use trust_dns_resolver::{TokioAsyncResolver, error::ResolveError};

use super::{MxError, MxRecord, sorted_hosts};
use crate::knowledge::{DomainMxCache, KnowledgeStore};

/// Source of raw MX answers. The production implementation is the tokio
/// resolver; tests plug in stubs.
#[async_trait]
pub trait LookupMx: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

#[async_trait]
impl LookupMx for TokioAsyncResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = self.mx_lookup(domain).await?;
        let records = lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), normalize_exchange(mx.exchange().to_utf8())))
            .collect();
        Ok(records)
    }
}

/// Resolves mail exchangers through the shared [`KnowledgeStore`] cache.
#[derive(Clone)]
pub struct MxResolver {
    lookup: Arc<dyn LookupMx>,
    store: Arc<KnowledgeStore>,
    timeout: Duration,
}

impl MxResolver {
    pub fn new(lookup: Arc<dyn LookupMx>, store: Arc<KnowledgeStore>, timeout: Duration) -> Self {
        Self {
            lookup,
            store,
            timeout,
        }
    }

    /// Uses the system resolver configuration (`/etc/resolv.conf` on unix).
    pub fn from_system_conf(store: Arc<KnowledgeStore>, timeout: Duration) -> Result<Self, MxError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(MxError::resolver_init)?;
        Ok(Self::new(Arc::new(resolver), store, timeout))
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    /// Mail hosts for `domain`, lexically sorted, or `None` when the domain
    /// has none. Every live outcome, including failures, is cached for the
    /// lifetime of the store.
    ///
    /// The cache keeps only the preferred (first) host, so a cache hit
    /// returns a single-element list. Callers that probe `hosts[0]` see the
    /// same host either way; callers needing the full set must not rely on
    /// a repeated call to return it.
    pub async fn resolve_mx(&self, domain: &str) -> Option<Vec<String>> {
        if let Some(row) = self.store.cached_mx(domain) {
            debug!(domain, mx_found = row.mx_found, "MX cache hit");
            return row.hosts();
        }

        match self.lookup_hosts(domain).await {
            Ok(hosts) => {
                let preferred = hosts.first().cloned().unwrap_or_default();
                debug!(domain, mx = %preferred, count = hosts.len(), "MX resolved");
                self.store.upsert_mx(DomainMxCache::found(domain, preferred));
                Some(hosts)
            }
            Err(err) => {
                match &err {
                    MxError::Lookup { .. } | MxError::NoRecords { .. } => {
                        debug!(domain, error = %err, "MX resolution failed")
                    }
                    _ => warn!(domain, error = %err, "MX resolution failed"),
                }
                self.store.upsert_mx(DomainMxCache::missing(domain));
                None
            }
        }
    }

    async fn lookup_hosts(&self, domain: &str) -> Result<Vec<String>, MxError> {
        let ascii = normalize_domain(domain)?;
        let records = tokio::time::timeout(self.timeout, self.lookup.lookup_mx(&ascii))
            .await
            .map_err(|_| MxError::timeout(&ascii, self.timeout))?
            .map_err(MxError::lookup)?;

        let hosts = sorted_hosts(records);
        if hosts.is_empty() {
            return Err(MxError::no_records(&ascii));
        }
        Ok(hosts)
    }
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, MxError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(MxError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(MxError::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}
