use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Curated fact about a domain (e.g. `disposable`). Read-only once seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainKnowledgeEntry {
    pub domain: String,
    pub category: String,
}

/// Last MX resolution outcome for a domain. Negative outcomes are kept too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMxCache {
    pub domain: String,
    pub mx_found: bool,
    /// Empty when `mx_found` is false.
    pub preferred_mx: String,
    pub resolved_at: DateTime<Utc>,
}

impl DomainMxCache {
    pub fn found(domain: impl Into<String>, preferred_mx: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            mx_found: true,
            preferred_mx: preferred_mx.into(),
            resolved_at: Utc::now(),
        }
    }

    pub fn missing(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            mx_found: false,
            preferred_mx: String::new(),
            resolved_at: Utc::now(),
        }
    }

    /// Host list as returned to callers on a cache hit.
    pub fn hosts(&self) -> Option<Vec<String>> {
        if self.mx_found && !self.preferred_mx.is_empty() {
            Some(vec![self.preferred_mx.clone()])
        } else {
            None
        }
    }
}

/// What the store knows about a domain, curated facts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainInfo {
    Flagged(String),
    Cached(DomainMxCache),
    Unknown,
}
