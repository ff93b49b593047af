//! Domain Knowledge Store: curated domain categories plus cached MX outcomes.
//!
//! One store is shared by every in-flight verification. Writes are upserts
//! keyed by domain; the value is a pure function of the domain's DNS answer,
//! so concurrent writers can only race to write the same row.

mod error;
mod seed;
mod types;

pub use error::SeedError;
pub use seed::{BUILTIN_DISPOSABLE, SeedFile, builtin_entries};
pub use types::{DomainInfo, DomainKnowledgeEntry, DomainMxCache};

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct KnowledgeStore {
    categories: RwLock<HashMap<String, String>>,
    mx_cache: RwLock<HashMap<String, DomainMxCache>>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with [`BUILTIN_DISPOSABLE`].
    pub fn with_builtin_seed() -> Self {
        let store = Self::new();
        store.seed(builtin_entries());
        store
    }

    /// Inserts curated entries; the first category seen for a domain wins.
    pub fn seed<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = DomainKnowledgeEntry>,
    {
        let mut categories = self.categories.write();
        let mut inserted = 0;
        for entry in entries {
            let domain = normalize_key(&entry.domain);
            if domain.is_empty() {
                continue;
            }
            if let std::collections::hash_map::Entry::Vacant(slot) = categories.entry(domain) {
                slot.insert(entry.category);
                inserted += 1;
            }
        }
        inserted
    }

    pub fn seed_from_file(&self, path: &Path) -> Result<usize, SeedError> {
        let file = SeedFile::load(path)?;
        let inserted = self.seed(file.entries()?);
        tracing::info!(path = %path.display(), inserted, "domain knowledge seeded");
        Ok(inserted)
    }

    pub fn category(&self, domain: &str) -> Option<String> {
        self.categories.read().get(&normalize_key(domain)).cloned()
    }

    pub fn cached_mx(&self, domain: &str) -> Option<DomainMxCache> {
        self.mx_cache.read().get(&normalize_key(domain)).cloned()
    }

    /// Curated category first, then any cached MX outcome.
    pub fn domain_info(&self, domain: &str) -> DomainInfo {
        if let Some(category) = self.category(domain) {
            return DomainInfo::Flagged(category);
        }
        match self.cached_mx(domain) {
            Some(row) => DomainInfo::Cached(row),
            None => DomainInfo::Unknown,
        }
    }

    /// Latest resolution overwrites the previous row.
    pub fn upsert_mx(&self, row: DomainMxCache) {
        let key = normalize_key(&row.domain);
        self.mx_cache.write().insert(key, row);
    }

    pub fn category_count(&self) -> usize {
        self.categories.read().len()
    }

    pub fn mx_cache_len(&self) -> usize {
        self.mx_cache.read().len()
    }
}

fn normalize_key(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}
