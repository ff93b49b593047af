//! Probe Service: `POST /verify` runs the local SMTP handshake on behalf of
//! hosts that cannot reach port 25 themselves.
//!
//! The service is stateless. A request whose token does not match is
//! answered with 403 and never reaches the prober; neither does one whose
//! address or host would not fit on a single SMTP command line (422).

mod error;

pub use error::ServiceError;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::smtp_verify::{LocalProber, ProbeRequest, ProbeResponse};
use crate::validator::{ValidationMode, validate_email};

const MAX_HOST_LEN: usize = 253;

pub struct ServiceState {
    prober: LocalProber,
    token: String,
}

impl ServiceState {
    pub fn new(prober: LocalProber, token: impl Into<String>) -> Self {
        Self {
            prober,
            token: token.into(),
        }
    }
}

pub fn router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/verify", post(verify_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn verify_handler(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<ProbeRequest>,
) -> Result<Json<ProbeResponse>, ServiceError> {
    if !token_matches(&request.token, &state.token) {
        warn!(email = %request.email, mx = %request.mx, "rejected probe request: bad token");
        return Err(ServiceError::InvalidToken);
    }
    check_request(&request)?;
    let verification = state.prober.check(&request.email, &request.mx).await;
    info!(
        email = %request.email,
        mx = %request.mx,
        verdict = %verification.verdict,
        "probe served"
    );
    Ok(Json(verification.into()))
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServiceError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind { addr, source })
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: Arc<ServiceState>, shutdown: F) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn check_request(request: &ProbeRequest) -> Result<(), ServiceError> {
    let report = validate_email(&request.email, ValidationMode::Relaxed);
    if !report.ok || request.email.trim() != request.email {
        warn!(reasons = ?report.reasons, "rejected probe request: bad email");
        return Err(ServiceError::InvalidRequest(format!(
            "email {:?} is not a valid address",
            request.email
        )));
    }
    if !is_mail_host(&request.mx) {
        warn!("rejected probe request: bad mx host");
        return Err(ServiceError::InvalidRequest(format!(
            "mx {:?} is not a host name or IP address",
            request.mx
        )));
    }
    Ok(())
}

/// An IP literal, or dot-separated labels of ASCII letters, digits and `-`.
fn is_mail_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    let name = host.strip_suffix('.').unwrap_or(host);
    !name.is_empty()
        && name.len() <= MAX_HOST_LEN
        && name.split('.').all(|label| {
            (1..=63).contains(&label.len())
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

/// Length-independent comparison of the shared secret.
fn token_matches(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    let mut diff = given.len() ^ expected.len();
    for (i, byte) in expected.iter().enumerate() {
        diff |= usize::from(byte ^ given.get(i).copied().unwrap_or(0));
    }
    diff == 0 && !expected.is_empty()
}
