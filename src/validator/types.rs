use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Strict,
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// An address after trimming and lower-casing, split on its final `@`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEmail {
    pub original: String,
    /// Trimmed, lower-cased text; also the result-cache key.
    pub address: String,
    pub local: String,
    pub domain: String,
    pub ascii_domain: String,
    pub mode: ValidationMode,
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl NormalizedEmail {
    /// Domain to use for lookups: the IDNA form when available.
    pub fn lookup_domain(&self) -> &str {
        if self.ascii_domain.is_empty() {
            &self.domain
        } else {
            &self.ascii_domain
        }
    }

    /// Address as it should appear in `RCPT TO`.
    pub fn envelope_address(&self) -> String {
        format!("{}@{}", self.local, self.lookup_domain())
    }

    pub fn syntax_details(&self) -> String {
        if self.reasons.is_empty() {
            "invalid email syntax".to_string()
        } else {
            self.reasons.join("; ")
        }
    }
}
