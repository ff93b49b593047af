use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::CommandFactory;
use mailprobe::{BatchRunner, NdjsonSink, Settings};
use tracing_subscriber::EnvFilter;

#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;

use args::{Cli, Format};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = cli.parsed_mode()?;
    let format = Format::parse(&cli.format)?;
    let settings = settings_from(&cli)?;
    tracing::debug!(?settings, "settings resolved");

    let emails = collect_emails(&cli)?;
    if emails.is_empty() {
        <Cli as CommandFactory>::command().print_help()?;
        println!();
        return Ok(());
    }

    let verifier = settings
        .verifier()
        .context("initialize verifier")?
        .with_mode(mode);
    let mut runner = BatchRunner::new(Arc::new(verifier)).with_concurrency(settings.concurrency);
    if let Some(path) = &cli.log {
        let sink = NdjsonSink::append(path)
            .with_context(|| format!("open result log {}", path.display()))?;
        runner = runner.with_sink(Arc::new(sink));
    }

    let outcomes = runner.run(emails).await;
    let rendered = output::render(&outcomes, format)?;
    output::emit(&rendered, cli.out.as_deref())?;

    let stats = runner.stats().snapshot();
    eprintln!("{stats}");

    // codes de sortie : 0 OK, 1 jeton refusé par le service de sonde
    if outcomes
        .iter()
        .any(|o| o.as_ref().is_err_and(|failure| failure.is_unauthorized()))
    {
        tracing::error!("probe service rejected the shared token");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn settings_from(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("load configuration")?;
    if let Some(endpoint) = &cli.endpoint {
        settings.set_endpoint("--endpoint", endpoint)?;
    }
    if let Some(token) = &cli.token {
        settings.probe_token = Some(token.clone());
    }
    if let Some(concurrency) = cli.concurrency {
        settings.set_concurrency("--concurrency", &concurrency.to_string())?;
    }
    if let Some(seed) = &cli.seed {
        settings.seed_file = Some(seed.clone());
    }
    if let Some(secs) = cli.smtp_timeout_secs {
        settings.smtp.timeout = Duration::from_secs(secs.max(1));
    }
    if cli.no_optimistic_fallback {
        settings.smtp.optimistic_fallback = false;
    }
    Ok(settings)
}

fn collect_emails(cli: &Cli) -> Result<Vec<String>> {
    let mut emails = cli.emails.clone();
    if let Some(path) = &cli.file {
        emails.extend(read_lines(path)?);
    }
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            push_line(&mut emails, line.context("read stdin")?);
        }
    }
    Ok(emails)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut emails = Vec::new();
    for line in raw.lines() {
        push_line(&mut emails, line.to_string());
    }
    Ok(emails)
}

/// Blank lines and `#` comments are skipped.
fn push_line(emails: &mut Vec<String>, line: String) {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return;
    }
    emails.push(line);
}
