use serde::Serialize;
use thiserror::Error;

use crate::pipeline::VerifyError;
use crate::smtp_verify::{Verdict, Verification};

/// One delivered verdict. `email` echoes the input text as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub email: String,
    pub verdict: Verdict,
    pub details: String,
    /// Served from the result cache without any network call.
    pub cached: bool,
}

impl ProbeResult {
    pub fn new(email: impl Into<String>, verification: Verification, cached: bool) -> Self {
        Self {
            email: email.into(),
            verdict: verification.verdict,
            details: verification.details,
            cached,
        }
    }

    pub fn verification(&self) -> Verification {
        Verification::new(self.verdict, self.details.clone())
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("verification task aborted: {0}")]
    Aborted(String),
}

/// An input that produced no verdict.
#[derive(Debug, Error)]
#[error("{email}: {error}")]
pub struct BatchFailure {
    pub email: String,
    #[source]
    pub error: BatchError,
}

impl BatchFailure {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.error, BatchError::Verify(VerifyError::ProbeUnauthorized(_)))
    }
}
