use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::error::SeedError;
use super::types::DomainKnowledgeEntry;

/// Domains shipped with the crate, all flagged `disposable`.
pub const BUILTIN_DISPOSABLE: &[&str] = &["mailinator.com", "temp-mail.org"];

/// Seed file layout:
///
/// ```toml
/// [categories]
/// disposable = ["mailinator.com", "temp-mail.org"]
/// role = ["example-role.net"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl SeedFile {
    pub fn parse(source: &str, path: &Path) -> Result<Self, SeedError> {
        toml::from_str(source).map_err(|err| SeedError::parse(path, err))
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path).map_err(|err| SeedError::read(path, err))?;
        Self::parse(&content, path)
    }

    pub fn entries(&self) -> Result<Vec<DomainKnowledgeEntry>, SeedError> {
        let mut out = Vec::new();
        for (category, domains) in &self.categories {
            let category = category.trim();
            if category.is_empty() {
                return Err(SeedError::EmptyCategory(category.to_string()));
            }
            out.extend(domains.iter().map(|domain| DomainKnowledgeEntry {
                domain: domain.clone(),
                category: category.to_string(),
            }));
        }
        Ok(out)
    }
}

pub fn builtin_entries() -> Vec<DomainKnowledgeEntry> {
    BUILTIN_DISPOSABLE
        .iter()
        .map(|domain| DomainKnowledgeEntry {
            domain: (*domain).to_string(),
            category: "disposable".to_string(),
        })
        .collect()
}
