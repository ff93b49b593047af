use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::smtp_verify::error::{ProbeError, ProbeUnauthorized};
use crate::smtp_verify::options::SmtpProbeOptions;
use crate::smtp_verify::session::SmtpSession;
use crate::smtp_verify::types::{SmtpReply, Verification};

/// Capability to test one recipient against one mail exchanger.
///
/// Implementations fold every transport problem into a [`Verification`];
/// the only error they may return is an authorization failure of a remote
/// probe service.
#[async_trait]
pub trait SmtpProber: Send + Sync {
    async fn probe(&self, email: &str, mx_host: &str) -> Result<Verification, ProbeUnauthorized>;
}

const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Classifies the answer to `RCPT TO`.
pub fn classify_rcpt(reply: &SmtpReply) -> Verification {
    match reply.code {
        250 => Verification::valid("SMTP Verified"),
        550 => Verification::invalid("User does not exist (550)"),
        _ => Verification::risky(format!("SMTP Response: {reply}")),
    }
}

/// Outcome when the server refuses our envelope sender.
pub fn classify_mail_from(reply: &SmtpReply) -> Verification {
    Verification::unknown(format!("SMTP Mail From failed: {reply}"))
}

/// The "couldn't test" outcome, `Valid` unless the fallback is disabled.
pub fn unreachable_verdict(details: String, optimistic: bool) -> Verification {
    if optimistic {
        Verification::valid(details)
    } else {
        Verification::unknown(details)
    }
}

/// Probes from this host, straight to the MX on the configured port.
#[derive(Debug, Clone, Default)]
pub struct LocalProber {
    options: SmtpProbeOptions,
}

impl LocalProber {
    pub fn new(options: SmtpProbeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }

    /// Runs the handshake once, with no retry, and maps the outcome.
    ///
    /// `QUIT` is sent after the verdict is fixed, under its own short bound;
    /// a server that stalls on it cannot change the result.
    pub async fn check(&self, email: &str, mx_host: &str) -> Verification {
        let limit = self.options.timeout;
        let outcome = tokio::time::timeout(limit, self.converse(email, mx_host))
            .await
            .unwrap_or_else(|_| Err(ProbeError::Timeout(limit)));

        match outcome {
            Ok((verification, mut session)) => {
                let quit_limit = limit.min(QUIT_TIMEOUT);
                if tokio::time::timeout(quit_limit, session.quit()).await.is_err() {
                    debug!(mx = mx_host, "QUIT not acknowledged in time");
                }
                debug!(
                    email,
                    mx = mx_host,
                    verdict = %verification.verdict,
                    transcript = ?session.transcript,
                    "SMTP probe finished"
                );
                verification
            }
            Err(err) if err.is_unreachable() => {
                warn!(email, mx = mx_host, error = %err, "mail exchanger unreachable");
                unreachable_verdict(
                    format!("DNS verified, deep SMTP check unavailable ({err})"),
                    self.options.optimistic_fallback,
                )
            }
            Err(err) => {
                debug!(email, mx = mx_host, error = %err, "SMTP conversation failed");
                Verification::error(format!("SMTP Connect failed: {err}"))
            }
        }
    }

    /// Everything up to the decisive reply. The open session is handed back
    /// so the caller can close it.
    async fn converse(
        &self,
        email: &str,
        mx_host: &str,
    ) -> Result<(Verification, SmtpSession), ProbeError> {
        let mut session = SmtpSession::connect(mx_host, self.options.port).await?;

        let banner = session.read_banner().await?;
        if !banner.is_positive_completion() {
            let verdict = Verification::error(format!("SMTP Greeting rejected: {banner}"));
            return Ok((verdict, session));
        }

        let helo_domain = &self.options.helo_domain;
        let ehlo = session.send_command(&format!("EHLO {helo_domain}")).await?;
        if !ehlo.is_positive_completion() {
            let helo = session.send_command(&format!("HELO {helo_domain}")).await?;
            if !helo.is_positive_completion() {
                let verdict = Verification::error(format!("SMTP EHLO failed: {helo}"));
                return Ok((verdict, session));
            }
        }

        let mail = session
            .send_command(&format!("MAIL FROM:<{}>", self.options.mail_from))
            .await?;
        if mail.code != 250 {
            return Ok((classify_mail_from(&mail), session));
        }

        let rcpt = session.send_command(&format!("RCPT TO:<{email}>")).await?;
        Ok((classify_rcpt(&rcpt), session))
    }
}

#[async_trait]
impl SmtpProber for LocalProber {
    async fn probe(&self, email: &str, mx_host: &str) -> Result<Verification, ProbeUnauthorized> {
        Ok(self.check(email, mx_host).await)
    }
}
