//! Probe Service: runs the SMTP handshake for remote batch runners.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mailprobe::service::{self, ServiceState};
use mailprobe::{LocalProber, Settings};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "probe-service", version, about = "Service HTTP de sonde SMTP")]
struct Args {
    /// fichier de configuration TOML
    #[arg(long, env = "MAILPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// adresse d'écoute (par défaut [service].listen)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// logs détaillés (debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();

    let settings = Settings::load(args.config.as_deref()).context("load configuration")?;
    let token = settings.require_token("the probe service")?.to_string();
    let listen = args.listen.unwrap_or(settings.listen);

    let state = Arc::new(ServiceState::new(LocalProber::new(settings.smtp.clone()), token));
    let listener = service::bind(listen).await?;
    info!(%listen, smtp_port = settings.smtp.port, "probe service listening");

    service::serve(listener, state, shutdown_signal()).await?;
    info!("probe service shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
