use std::time::Duration;

/// Knobs of the local SMTP handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub port: u16,
    pub helo_domain: String,
    pub mail_from: String,
    /// Bound on the whole conversation, connect included.
    pub timeout: Duration,
    /// When the MX cannot be reached, answer `Valid` instead of `Unknown`.
    pub optimistic_fallback: bool,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            helo_domain: "localhost".to_string(),
            mail_from: "verify@example.com".to_string(),
            timeout: Duration::from_secs(10),
            optimistic_fallback: true,
        }
    }
}
