use std::path::PathBuf;

use thiserror::Error;

use crate::knowledge::SeedError;
use crate::mx::MxError;
use crate::smtp_verify::ProbeError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} requires a probe token (set [probe].token or MAILPROBE_PROBE_TOKEN)")]
    MissingToken(&'static str),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Resolver(#[from] MxError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
