use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::smtp_verify::error::{ProbeError, ProbeUnauthorized};
use crate::smtp_verify::probe::{SmtpProber, unreachable_verdict};
use crate::smtp_verify::types::{ProbeRequest, ProbeResponse, Verification};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Delegates the handshake to a probe service on a host with outbound
/// port 25.
#[derive(Clone)]
pub struct RemoteProber {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
    optimistic_fallback: bool,
}

impl fmt::Debug for RemoteProber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProber")
            .field("endpoint", &self.endpoint.as_str())
            .field("optimistic_fallback", &self.optimistic_fallback)
            .finish_non_exhaustive()
    }
}

impl RemoteProber {
    pub fn new(endpoint: Url, token: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mailprobe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ProbeError::HttpClient { source })?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
            optimistic_fallback: true,
        })
    }

    pub fn with_optimistic_fallback(mut self, enabled: bool) -> Self {
        self.optimistic_fallback = enabled;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn unreachable(&self, err: &reqwest::Error) -> Verification {
        warn!(endpoint = %self.endpoint, error = %err, "probe service unreachable");
        unreachable_verdict(
            format!("DNS passed, SMTP worker unreachable: {err}"),
            self.optimistic_fallback,
        )
    }
}

#[async_trait]
impl SmtpProber for RemoteProber {
    async fn probe(&self, email: &str, mx_host: &str) -> Result<Verification, ProbeUnauthorized> {
        let request = ProbeRequest {
            email: email.to_string(),
            mx: mx_host.to_string(),
            token: self.token.clone(),
        };
        debug!(email, mx = mx_host, endpoint = %self.endpoint, "delegating probe");

        let response = match self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return Ok(self.unreachable(&err)),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(ProbeUnauthorized {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Verification::unknown(format!("Worker Error: {body}")));
        }

        match response.json::<ProbeResponse>().await {
            Ok(body) => Ok(body.into()),
            Err(err) => Ok(self.unreachable(&err)),
        }
    }
}
