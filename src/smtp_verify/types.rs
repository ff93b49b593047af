use std::fmt;

use serde::{Deserialize, Serialize};

/// Five-valued classification; every value is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Invalid,
    Risky,
    Unknown,
    Error,
}

impl Verdict {
    pub const ALL: [Verdict; 5] = [
        Verdict::Valid,
        Verdict::Invalid,
        Verdict::Risky,
        Verdict::Unknown,
        Verdict::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Invalid => "Invalid",
            Self::Risky => "Risky",
            Self::Unknown => "Unknown",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict with its human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub verdict: Verdict,
    pub details: String,
}

impl Verification {
    pub fn new(verdict: Verdict, details: impl Into<String>) -> Self {
        Self {
            verdict,
            details: details.into(),
        }
    }

    pub fn valid(details: impl Into<String>) -> Self {
        Self::new(Verdict::Valid, details)
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::new(Verdict::Invalid, details)
    }

    pub fn risky(details: impl Into<String>) -> Self {
        Self::new(Verdict::Risky, details)
    }

    pub fn unknown(details: impl Into<String>) -> Self {
        Self::new(Verdict::Unknown, details)
    }

    pub fn error(details: impl Into<String>) -> Self {
        Self::new(Verdict::Error, details)
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn message(&self) -> String {
        self.lines.join(" ")
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message())
    }
}

/// Body of `POST /verify` on the probe service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub email: String,
    pub mx: String,
    pub token: String,
}

impl fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRequest")
            .field("email", &self.email)
            .field("mx", &self.mx)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Successful answer of the probe service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub status: Verdict,
    pub details: String,
}

impl From<Verification> for ProbeResponse {
    fn from(v: Verification) -> Self {
        Self {
            status: v.verdict,
            details: v.details,
        }
    }
}

impl From<ProbeResponse> for Verification {
    fn from(r: ProbeResponse) -> Self {
        Self {
            verdict: r.status,
            details: r.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_wire_format() {
        let body = serde_json::to_string(&ProbeResponse::from(Verification::invalid(
            "User does not exist (550)",
        )))
        .expect("serialize");
        insta::assert_snapshot!(body, @r#"{"status":"Invalid","details":"User does not exist (550)"}"#);
    }

    #[test]
    fn request_wire_format() {
        let body = serde_json::to_string(&ProbeRequest {
            email: "user@example.com".into(),
            mx: "mx.example.com".into(),
            token: "s3cret".into(),
        })
        .expect("serialize");
        insta::assert_snapshot!(body, @r#"{"email":"user@example.com","mx":"mx.example.com","token":"s3cret"}"#);
    }

    #[test]
    fn request_debug_hides_token() {
        let req = ProbeRequest {
            email: "user@example.com".into(),
            mx: "mx.example.com".into(),
            token: "s3cret".into(),
        };
        assert!(!format!("{req:?}").contains("s3cret"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let parsed = serde_json::from_str::<ProbeResponse>(r#"{"status":"Maybe","details":""}"#);
        assert!(parsed.is_err());
    }
}
