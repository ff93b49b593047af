use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Host names ordered lexically, preference ignored. The first entry is the
/// host that gets probed.
pub fn sorted_hosts(records: Vec<MxRecord>) -> Vec<String> {
    let mut hosts: Vec<String> = records
        .into_iter()
        .map(|record| record.exchange)
        .filter(|exchange| !exchange.is_empty())
        .collect();
    hosts.sort();
    hosts.dedup();
    hosts
}
