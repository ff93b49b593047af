//! Runtime settings: defaults, then an optional TOML file, then the
//! environment. Binaries apply their command-line flags last.

mod error;
mod file;

pub use error::ConfigError;
pub use file::ConfigFile;

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::batch::DEFAULT_CONCURRENCY;
use crate::knowledge::KnowledgeStore;
use crate::mx::MxResolver;
use crate::pipeline::Verifier;
use crate::smtp_verify::{
    DEFAULT_REMOTE_TIMEOUT, LocalProber, RemoteProber, SmtpProbeOptions, SmtpProber,
};

pub const ENV_PROBE_ENDPOINT: &str = "MAILPROBE_PROBE_ENDPOINT";
pub const ENV_PROBE_TOKEN: &str = "MAILPROBE_PROBE_TOKEN";
pub const ENV_CONCURRENCY: &str = "MAILPROBE_CONCURRENCY";
pub const LEGACY_ENV_ENDPOINT: &str = "VPS_WORKER_URL";
pub const LEGACY_ENV_TOKEN: &str = "VPS_WORKER_TOKEN";

const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

#[derive(Clone)]
pub struct Settings {
    /// Probe service URL; `None` means probe locally.
    pub probe_endpoint: Option<Url>,
    pub probe_token: Option<String>,
    pub remote_timeout: Duration,
    pub smtp: SmtpProbeOptions,
    pub dns_timeout: Duration,
    pub concurrency: usize,
    pub seed_file: Option<PathBuf>,
    pub listen: SocketAddr,
    pub loaded_config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_endpoint: None,
            probe_token: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            smtp: SmtpProbeOptions::default(),
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            seed_file: None,
            listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            loaded_config_path: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("probe_endpoint", &self.probe_endpoint.as_ref().map(Url::as_str))
            .field("probe_token_set", &self.probe_token.is_some())
            .field("remote_timeout", &self.remote_timeout)
            .field("smtp", &self.smtp)
            .field("dns_timeout", &self.dns_timeout)
            .field("concurrency", &self.concurrency)
            .field("seed_file", &self.seed_file)
            .field("listen", &self.listen)
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

impl Settings {
    /// File (if any) plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let mut settings = Self::from_toml_str(&raw, path)?;
                settings.loaded_config_path = Some(path.to_path_buf());
                settings
            }
            None => Self::default(),
        };
        settings.apply_env(env)?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file)
    }

    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(endpoint) = file.probe.endpoint {
            settings.set_endpoint("probe.endpoint", &endpoint)?;
        }
        settings.probe_token = file.probe.token.filter(|t| !t.is_empty());
        if let Some(secs) = file.probe.remote_timeout_secs {
            settings.remote_timeout = positive_secs("probe.remote_timeout_secs", secs)?;
        }

        if let Some(secs) = file.smtp.timeout_secs {
            settings.smtp.timeout = positive_secs("smtp.timeout_secs", secs)?;
        }
        if let Some(port) = file.smtp.port {
            if port == 0 {
                return Err(ConfigError::invalid("smtp.port", "0", "port must be non-zero"));
            }
            settings.smtp.port = port;
        }
        if let Some(mail_from) = file.smtp.mail_from {
            settings.smtp.mail_from = mail_from;
        }
        if let Some(helo) = file.smtp.helo_name {
            settings.smtp.helo_domain = helo;
        }
        if let Some(optimistic) = file.smtp.optimistic_fallback {
            settings.smtp.optimistic_fallback = optimistic;
        }

        if let Some(secs) = file.dns.timeout_secs {
            settings.dns_timeout = positive_secs("dns.timeout_secs", secs)?;
        }
        if let Some(concurrency) = file.batch.concurrency {
            settings.set_concurrency("batch.concurrency", &concurrency.to_string())?;
        }
        settings.seed_file = file.knowledge.seed_file;
        if let Some(listen) = file.service.listen {
            settings.listen = listen
                .parse()
                .map_err(|err| ConfigError::invalid("service.listen", listen.clone(), err))?;
        }
        Ok(settings)
    }

    /// `MAILPROBE_*` names win over the legacy `VPS_WORKER_*` ones.
    pub fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |primary: &str, legacy: Option<&str>| {
            env(primary)
                .or_else(|| legacy.and_then(|key| env(key)))
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(endpoint) = lookup(ENV_PROBE_ENDPOINT, Some(LEGACY_ENV_ENDPOINT)) {
            self.set_endpoint(ENV_PROBE_ENDPOINT, &endpoint)?;
        }
        if let Some(token) = lookup(ENV_PROBE_TOKEN, Some(LEGACY_ENV_TOKEN)) {
            self.probe_token = Some(token);
        }
        if let Some(concurrency) = lookup(ENV_CONCURRENCY, None) {
            self.set_concurrency(ENV_CONCURRENCY, &concurrency)?;
        }
        Ok(())
    }

    pub fn set_endpoint(&mut self, key: &'static str, raw: &str) -> Result<(), ConfigError> {
        let url = Url::parse(raw.trim()).map_err(|err| ConfigError::invalid(key, raw, err))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(key, raw, "scheme must be http or https"));
        }
        self.probe_endpoint = Some(url);
        Ok(())
    }

    pub fn set_concurrency(&mut self, key: &'static str, raw: &str) -> Result<(), ConfigError> {
        let value: usize = raw
            .trim()
            .parse()
            .map_err(|err| ConfigError::invalid(key, raw, err))?;
        if value == 0 {
            return Err(ConfigError::invalid(key, raw, "concurrency must be at least 1"));
        }
        self.concurrency = value;
        Ok(())
    }

    /// Token the probe service must check; there is no default secret.
    pub fn require_token(&self, context: &'static str) -> Result<&str, ConfigError> {
        self.probe_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken(context))
    }

    pub fn knowledge_store(&self) -> Result<KnowledgeStore, ConfigError> {
        let store = KnowledgeStore::with_builtin_seed();
        if let Some(path) = &self.seed_file {
            store.seed_from_file(path)?;
        }
        Ok(store)
    }

    /// Remote prober when an endpoint is configured, local otherwise.
    pub fn prober(&self) -> Result<Arc<dyn SmtpProber>, ConfigError> {
        match &self.probe_endpoint {
            Some(endpoint) => {
                let token = self.require_token("remote probing")?;
                let remote = RemoteProber::new(endpoint.clone(), token, self.remote_timeout)?
                    .with_optimistic_fallback(self.smtp.optimistic_fallback);
                Ok(Arc::new(remote))
            }
            None => Ok(Arc::new(LocalProber::new(self.smtp.clone()))),
        }
    }

    pub fn verifier(&self) -> Result<Verifier, ConfigError> {
        let store = Arc::new(self.knowledge_store()?);
        let mx = MxResolver::from_system_conf(store, self.dns_timeout)?;
        Ok(Verifier::new(mx, self.prober()?))
    }

    pub fn default_listen() -> &'static str {
        DEFAULT_LISTEN
    }
}

fn positive_secs(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::invalid(key, "0", "timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}
