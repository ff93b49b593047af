//! MX resolution with process-lifetime caching.
//!
//! [`MxResolver::resolve_mx`] answers from the [`KnowledgeStore`](crate::knowledge::KnowledgeStore)
//! when it can, otherwise runs one time-bounded lookup and records the
//! outcome, positive or negative.

mod error;
mod resolver;
mod types;

pub use error::MxError;
pub use resolver::{LookupMx, MxResolver};
pub use types::{MxRecord, sorted_hosts};
