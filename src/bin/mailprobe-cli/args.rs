use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use mailprobe::ValidationMode;

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Vérification d'adresses e-mail en masse")]
pub struct Cli {
    /// adresses à vérifier
    pub emails: Vec<String>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// lit des adresses depuis un fichier (une par ligne)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// fichier de configuration TOML
    #[arg(long, env = "MAILPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// mode: strict|relaxed
    #[arg(long, default_value = "strict")]
    pub mode: String,

    /// format: human|json|ndjson
    #[arg(long, default_value = "human")]
    pub format: String,

    /// écrit le rapport dans un fichier (sinon stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// journal NDJSON, une ligne par résultat (ajout)
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// nombre maximum de vérifications simultanées
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// URL du service de sonde distant (mode local si absent)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// jeton partagé du service de sonde
    #[arg(long)]
    pub token: Option<String>,

    /// fichier TOML de domaines catégorisés
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// timeout SMTP (secondes)
    #[arg(long = "smtp-timeout")]
    pub smtp_timeout_secs: Option<u64>,

    /// MX injoignable => Unknown au lieu de Valid
    #[arg(long)]
    pub no_optimistic_fallback: bool,

    /// logs détaillés (debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn parsed_mode(&self) -> Result<ValidationMode> {
        mode_from_str(&self.mode)
    }
}

pub fn mode_from_str(s: &str) -> Result<ValidationMode> {
    match s {
        "strict" => Ok(ValidationMode::Strict),
        "relaxed" => Ok(ValidationMode::Relaxed),
        other => bail!("unknown --mode '{other}', use: strict|relaxed"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
    Ndjson,
}

impl Format {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            other => bail!("unknown --format '{other}', use: human|json|ndjson"),
        }
    }
}
