use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("MX lookup failed: {source}")]
    Lookup {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("MX lookup for {domain} timed out after {after:?}")]
    Timeout { domain: String, after: Duration },
    #[error("no usable MX records for {domain}")]
    NoRecords { domain: String },
}

impl MxError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::Lookup { source }
    }

    pub(crate) fn timeout(domain: &str, after: Duration) -> Self {
        Self::Timeout {
            domain: domain.to_string(),
            after,
        }
    }

    pub(crate) fn no_records(domain: &str) -> Self {
        Self::NoRecords {
            domain: domain.to_string(),
        }
    }
}
