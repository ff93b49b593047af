use std::io;
use std::time::Duration;

use thiserror::Error;

/// Transport-level failures of a probe. They never leave the prober: each
/// one folds into a [`Verification`](super::Verification).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("SMTP conversation timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP client initialization failed: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    pub(crate) fn connect(host: &str, source: io::Error) -> Self {
        Self::Connect {
            host: host.to_string(),
            source,
        }
    }

    /// Failures meaning "we could not get through", as opposed to a server
    /// that answered badly.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::PermissionDenied
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::AddrNotAvailable
                    | io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::HostUnreachable
            ),
            _ => false,
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

/// The probe service refused our shared token. This is a deployment
/// problem, not a property of the address, so it is never a verdict.
#[derive(Debug, Clone, Error)]
#[error("probe service at {endpoint} rejected the shared token (HTTP {status})")]
pub struct ProbeUnauthorized {
    pub endpoint: String,
    pub status: u16,
}
