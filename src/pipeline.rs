//! Single-address verification: syntax, domain knowledge, MX, SMTP probe.
//!
//! Each step may end the pipeline with a final verdict; later steps never
//! run once an earlier one has decided.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::knowledge::KnowledgeStore;
use crate::mx::MxResolver;
use crate::smtp_verify::{ProbeUnauthorized, SmtpProber, Verification};
use crate::validator::{ValidationMode, normalize_email};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    ProbeUnauthorized(#[from] ProbeUnauthorized),
}

pub struct Verifier {
    store: Arc<KnowledgeStore>,
    mx: MxResolver,
    prober: Arc<dyn SmtpProber>,
    mode: ValidationMode,
}

impl Verifier {
    /// The resolver's store is the one consulted for domain categories.
    pub fn new(mx: MxResolver, prober: Arc<dyn SmtpProber>) -> Self {
        Self {
            store: Arc::clone(mx.store()),
            mx,
            prober,
            mode: ValidationMode::Strict,
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub async fn verify(&self, raw: &str) -> Result<Verification, VerifyError> {
        let email = normalize_email(raw, self.mode);
        if !email.valid {
            debug!(email = raw, reasons = ?email.reasons, "syntax rejected");
            return Ok(Verification::invalid(email.syntax_details()));
        }

        let domain = email.lookup_domain();
        let category = self
            .store
            .category(domain)
            .or_else(|| self.store.category(&email.domain));
        if let Some(category) = category {
            debug!(email = %email.address, domain, category = %category, "domain flagged");
            return Ok(Verification::risky(format!("Domain flagged as {category}")));
        }

        let Some(hosts) = self.mx.resolve_mx(domain).await else {
            return Ok(Verification::invalid("No MX records found"));
        };
        let Some(mx_host) = hosts.first() else {
            return Ok(Verification::invalid("No MX records found"));
        };

        debug!(email = %email.address, domain, mx = %mx_host, "probing mailbox");
        let verification = self
            .prober
            .probe(&email.envelope_address(), mx_host)
            .await?;
        debug!(email = %email.address, verdict = %verification.verdict, "verified");
        Ok(verification)
    }
}
