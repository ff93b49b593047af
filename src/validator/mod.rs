//! Address syntax: normalization (trim + lower-case) and grammar checks.
//!
//! Nothing in this module touches the network; a failing report is final.

mod domain;
mod local;
mod types;

pub use types::{NormalizedEmail, ValidationMode, ValidationReport};

use domain::{check_domain, normalize_domain};
use local::local_part_reason;

const MAX_ADDRESS_LEN: usize = 254;

/// Grammar check only; an unusable address yields a failing report, never an error.
pub fn validate_email(email: &str, mode: ValidationMode) -> ValidationReport {
    let input = email.trim();
    let mut reasons = Vec::new();

    if input.len() > MAX_ADDRESS_LEN {
        reasons.push(format!("total length {} > {}", input.len(), MAX_ADDRESS_LEN));
    }

    let Some((local, domain)) = split_address(input) else {
        reasons.push("missing '@' separator".to_string());
        return ValidationReport { ok: false, reasons };
    };

    if let Some(reason) = local_part_reason(local, mode) {
        reasons.push(reason);
    }
    check_domain(domain, &mut reasons);

    ValidationReport {
        ok: reasons.is_empty(),
        reasons,
    }
}

/// Valide et renvoie la forme normalisée (minuscules, sans espaces),
/// découpée sur le dernier `@`.
pub fn normalize_email(email: &str, mode: ValidationMode) -> NormalizedEmail {
    let address = normalize_key(email);
    let report = validate_email(&address, mode);

    let (local, domain) = split_address(&address).unwrap_or_default();
    let (domain_lower, ascii_domain) = normalize_domain(domain);

    NormalizedEmail {
        original: email.to_string(),
        local: local.to_string(),
        domain: domain_lower,
        ascii_domain,
        address,
        mode,
        valid: report.ok,
        reasons: report.reasons,
    }
}

/// Canonical text for an address: trimmed and lower-cased.
pub fn normalize_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Splits on the final `@`, so quoted local parts may contain one.
fn split_address(input: &str) -> Option<(&str, &str)> {
    input.rsplit_once('@')
}
