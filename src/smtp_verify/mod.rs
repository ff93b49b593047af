//! SMTP mailbox probing.
//!
//! [`SmtpProber`] is the seam the pipeline depends on. [`LocalProber`] talks
//! to the mail exchanger directly (EHLO, MAIL FROM, RCPT TO, never DATA);
//! [`RemoteProber`] forwards the same question to a probe service over HTTP.
//! Both share the RCPT decision table in [`classify_rcpt`].

mod error;
mod options;
mod probe;
mod remote;
mod session;
mod types;

pub use error::{ProbeError, ProbeUnauthorized};
pub use options::SmtpProbeOptions;
pub use probe::{LocalProber, SmtpProber, classify_mail_from, classify_rcpt, unreachable_verdict};
pub use remote::{DEFAULT_REMOTE_TIMEOUT, RemoteProber};
pub use types::{ProbeRequest, ProbeResponse, SmtpReply, Verdict, Verification};

#[cfg(test)]
pub(crate) mod tests;
