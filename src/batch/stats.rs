use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::smtp_verify::Verdict;

use super::types::ProbeResult;

/// Live counters, safe to read while a batch is running.
#[derive(Debug, Default)]
pub struct BatchStats {
    processed: AtomicUsize,
    valid: AtomicUsize,
    invalid: AtomicUsize,
    risky: AtomicUsize,
    unknown: AtomicUsize,
    error: AtomicUsize,
    cached: AtomicUsize,
    failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub risky: usize,
    pub unknown: usize,
    pub error: usize,
    pub cached: usize,
    pub failures: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, result: &ProbeResult) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if result.cached {
            self.cached.fetch_add(1, Ordering::Relaxed);
        }
        let counter = match result.verdict {
            Verdict::Valid => &self.valid,
            Verdict::Invalid => &self.invalid,
            Verdict::Risky => &self.risky,
            Verdict::Unknown => &self.unknown,
            Verdict::Error => &self.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            risky: self.risky.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Share of processed items answered from the result cache.
    pub fn cache_hit_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.cached as f64 / self.processed as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} valid={} invalid={} risky={} unknown={} error={} cached={} failures={}",
            self.processed,
            self.valid,
            self.invalid,
            self.risky,
            self.unknown,
            self.error,
            self.cached,
            self.failures
        )
    }
}
