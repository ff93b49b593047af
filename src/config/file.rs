//! On-disk TOML layout. Every field is optional; absent values take the
//! defaults from [`Settings`](super::Settings).

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) probe: ProbeSection,
    #[serde(default)]
    pub(crate) smtp: SmtpSection,
    #[serde(default)]
    pub(crate) dns: DnsSection,
    #[serde(default)]
    pub(crate) batch: BatchSection,
    #[serde(default)]
    pub(crate) knowledge: KnowledgeSection,
    #[serde(default)]
    pub(crate) service: ServiceSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProbeSection {
    pub(crate) endpoint: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) remote_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpSection {
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) port: Option<u16>,
    pub(crate) mail_from: Option<String>,
    pub(crate) helo_name: Option<String>,
    pub(crate) optimistic_fallback: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsSection {
    pub(crate) timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchSection {
    pub(crate) concurrency: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct KnowledgeSection {
    pub(crate) seed_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ServiceSection {
    pub(crate) listen: Option<String>,
}
