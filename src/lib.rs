#![forbid(unsafe_code)]
//! mailprobe — vérification d'adresses e-mail en masse
//! (syntaxe, réputation du domaine, MX, sonde SMTP RCPT).

pub mod validator;
pub use validator::{
    NormalizedEmail, ValidationMode, ValidationReport, normalize_email, normalize_key,
    validate_email,
};

pub mod knowledge;
pub use knowledge::{DomainInfo, DomainKnowledgeEntry, DomainMxCache, KnowledgeStore, SeedError};

pub mod mx;
pub use mx::{LookupMx, MxError, MxRecord, MxResolver};

pub mod smtp_verify;
pub use smtp_verify::{
    LocalProber, ProbeError, ProbeRequest, ProbeResponse, ProbeUnauthorized, RemoteProber,
    SmtpProbeOptions, SmtpProber, Verdict, Verification,
};

pub mod pipeline;
pub use pipeline::{Verifier, VerifyError};

pub mod batch;
pub use batch::{
    BatchFailure, BatchRunner, BatchStats, NdjsonSink, ProbeResult, ResultCache, ResultSink,
};

pub mod config;
pub use config::{ConfigError, Settings};

#[cfg(feature = "with-service")]
pub mod service;
