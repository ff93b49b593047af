use std::collections::HashMap;

use parking_lot::RwLock;

use crate::smtp_verify::Verification;
use crate::validator::normalize_key;

/// Final verdicts keyed by normalized address; lives as long as the caller
/// keeps it, so reruns over the same list skip the network entirely.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, Verification>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, email: &str) -> Option<Verification> {
        self.entries.read().get(&normalize_key(email)).cloned()
    }

    pub fn insert(&self, email: &str, verification: Verification) {
        self.entries.write().insert(normalize_key(email), verification);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
