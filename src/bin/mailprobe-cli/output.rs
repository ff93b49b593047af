use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use mailprobe::Verdict;
use mailprobe::batch::BatchOutcome;
use serde::Serialize;

use crate::args::Format;

#[derive(Serialize)]
pub struct OutputRow<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub details: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> OutputRow<'a> {
    pub fn from_outcome(outcome: &'a BatchOutcome) -> Self {
        match outcome {
            Ok(result) => Self {
                email: &result.email,
                verdict: Some(result.verdict),
                details: result.details.clone(),
                cached: result.cached,
                error: None,
            },
            Err(failure) => Self {
                email: &failure.email,
                verdict: None,
                details: String::new(),
                cached: false,
                error: Some(failure.error.to_string()),
            },
        }
    }
}

pub fn render(outcomes: &[BatchOutcome], format: Format) -> Result<Vec<u8>> {
    let rows: Vec<OutputRow<'_>> = outcomes.iter().map(OutputRow::from_outcome).collect();
    let mut buf = Vec::new();
    match format {
        Format::Human => {
            for row in &rows {
                match (&row.verdict, &row.error) {
                    (Some(verdict), _) => {
                        let tag = format!("[{verdict}]");
                        let cached = if row.cached { " (cache)" } else { "" };
                        writeln!(buf, "{tag:<10} {} :: {}{cached}", row.email, row.details)?;
                    }
                    (None, Some(error)) => writeln!(buf, "{:<10} {} :: {error}", "[FAILED]", row.email)?,
                    (None, None) => writeln!(buf, "{:<10} {}", "[FAILED]", row.email)?,
                }
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut buf, &rows)?;
            buf.push(b'\n');
        }
        Format::Ndjson => {
            for row in &rows {
                serde_json::to_writer(&mut buf, row)?;
                buf.push(b'\n');
            }
        }
    }
    Ok(buf)
}

pub fn emit(bytes: &[u8], out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => write_all_atomically(path, bytes),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("write stdout")?;
            stdout.flush().context("flush stdout")
        }
    }
}

fn write_all_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}
