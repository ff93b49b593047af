//! Bulk verification with a fixed concurrency limit.
//!
//! At most `concurrency` verifications are in flight at any instant. Every
//! input yields exactly one entry in the output; one item's failure never
//! affects its siblings.

mod cache;
mod sink;
mod stats;
mod types;

pub use cache::ResultCache;
pub use sink::{NdjsonSink, ResultSink};
pub use stats::{BatchStats, StatsSnapshot};
pub use types::{BatchError, BatchFailure, ProbeResult};

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::pipeline::Verifier;

pub const DEFAULT_CONCURRENCY: usize = 50;

pub type BatchOutcome = Result<ProbeResult, BatchFailure>;

pub struct BatchRunner {
    verifier: Arc<Verifier>,
    cache: Arc<ResultCache>,
    stats: Arc<BatchStats>,
    sink: Option<Arc<dyn ResultSink>>,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(verifier: Arc<Verifier>) -> Self {
        Self {
            verifier,
            cache: Arc::new(ResultCache::new()),
            stats: Arc::new(BatchStats::new()),
            sink: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn stats(&self) -> &Arc<BatchStats> {
        &self.stats
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Outputs follow input order.
    pub async fn run<I, S>(&self, emails: I) -> Vec<BatchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let emails: Vec<String> = emails.into_iter().map(Into::into).collect();
        let total = emails.len();
        let started = Instant::now();
        info!(total, concurrency = self.concurrency, "batch started");

        let mut slots: Vec<Option<BatchOutcome>> = (0..total).map(|_| None).collect();
        let mut pending = emails.iter().cloned().enumerate();
        let mut join_set: JoinSet<(usize, BatchOutcome)> = JoinSet::new();

        for _ in 0..self.concurrency.min(total) {
            if let Some((index, email)) = pending.next() {
                self.spawn_one(&mut join_set, index, email);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    self.deliver(&outcome);
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(err) => error!(error = %err, "verification task did not complete"),
            }
            if let Some((index, email)) = pending.next() {
                self.spawn_one(&mut join_set, index, email);
            }
        }

        self.flush_sink().await;

        let outcomes: Vec<BatchOutcome> = slots
            .into_iter()
            .zip(emails)
            .map(|(slot, email)| {
                slot.unwrap_or_else(|| {
                    self.stats.record_failure();
                    Err(BatchFailure {
                        email,
                        error: BatchError::Aborted("task panicked or was cancelled".to_string()),
                    })
                })
            })
            .collect();

        let snapshot = self.stats.snapshot();
        info!(
            total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            cached = snapshot.cached,
            failures = snapshot.failures,
            "batch finished"
        );
        outcomes
    }

    fn spawn_one(&self, join_set: &mut JoinSet<(usize, BatchOutcome)>, index: usize, email: String) {
        let verifier = Arc::clone(&self.verifier);
        let cache = Arc::clone(&self.cache);
        join_set.spawn(async move { (index, verify_one(&verifier, &cache, email).await) });
    }

    async fn flush_sink(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let sink = Arc::clone(sink);
        match tokio::task::spawn_blocking(move || sink.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "result sink flush failed"),
            Err(err) => error!(error = %err, "result sink flush did not complete"),
        }
    }

    fn deliver(&self, outcome: &BatchOutcome) {
        match outcome {
            Ok(result) => {
                self.stats.record(result);
                if let Some(sink) = &self.sink {
                    if let Err(err) = sink.record(result) {
                        warn!(email = %result.email, error = %err, "result sink write failed");
                    }
                }
            }
            Err(failure) => {
                self.stats.record_failure();
                warn!(email = %failure.email, error = %failure.error, "verification failed");
            }
        }
    }
}

async fn verify_one(verifier: &Verifier, cache: &ResultCache, email: String) -> BatchOutcome {
    if let Some(hit) = cache.get(&email) {
        return Ok(ProbeResult::new(email, hit, true));
    }
    match verifier.verify(&email).await {
        Ok(verification) => {
            cache.insert(&email, verification.clone());
            Ok(ProbeResult::new(email, verification, false))
        }
        Err(err) => Err(BatchFailure {
            email,
            error: BatchError::Verify(err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::knowledge::KnowledgeStore;
    use crate::mx::MxResolver;
    use crate::mx::tests::StubResolver;
    use crate::smtp_verify::tests::StubProber;
    use crate::smtp_verify::{ProbeUnauthorized, Verdict, Verification};

    fn runner(dns: Arc<StubResolver>, smtp: Arc<StubProber>, concurrency: usize) -> BatchRunner {
        let store = Arc::new(KnowledgeStore::with_builtin_seed());
        let mx = MxResolver::new(dns, store, Duration::from_millis(500));
        BatchRunner::new(Arc::new(Verifier::new(mx, smtp))).with_concurrency(concurrency)
    }

    fn addresses(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("user{i}@domain{i}.example")).collect()
    }

    #[tokio::test]
    async fn every_input_appears_once() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::verified());
        let mut input = addresses(7);
        input.push("not-an-email".to_string());
        input.push("user@mailinator.com".to_string());

        let outcomes = runner(dns, smtp, 3).run(input.clone()).await;
        let emails: Vec<String> = outcomes
            .iter()
            .map(|o| o.as_ref().expect("verdict").email.clone())
            .collect();
        assert_eq!(emails, input);
    }

    #[tokio::test]
    async fn rerun_is_served_from_cache() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::verified());
        let runner = runner(Arc::clone(&dns), Arc::clone(&smtp), 4);
        let input = addresses(10);

        let first = runner.run(input.clone()).await;
        let dns_calls = dns.calls();
        let smtp_calls = smtp.calls();
        assert_eq!(smtp_calls, 10);

        let before = runner.stats().snapshot();
        let second = runner.run(input).await;
        let after = runner.stats().snapshot();

        assert_eq!(dns.calls(), dns_calls);
        assert_eq!(smtp.calls(), smtp_calls);
        assert_eq!(after.cached - before.cached, 10);
        for (a, b) in first.iter().zip(&second) {
            let (a, b) = (a.as_ref().expect("first"), b.as_ref().expect("second"));
            assert_eq!(a.verification(), b.verification());
            assert!(!a.cached);
            assert!(b.cached);
        }
    }

    #[tokio::test]
    async fn in_flight_never_exceeds_limit() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::verified().with_delay(Duration::from_millis(20)));
        let outcomes = runner(dns, Arc::clone(&smtp), 3).run(addresses(12)).await;
        assert_eq!(outcomes.len(), 12);
        assert_eq!(smtp.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn one_failure_leaves_siblings_alone() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::new(|email, _| {
            if email.starts_with("locked") {
                Err(ProbeUnauthorized {
                    endpoint: "http://probe.local/verify".into(),
                    status: 403,
                })
            } else if email.starts_with("boom") {
                Ok(Verification::error("SMTP Connect failed: reset"))
            } else {
                Ok(Verification::valid("SMTP Verified"))
            }
        }));
        let runner = runner(dns, smtp, 2);
        let outcomes = runner
            .run([
                "a@one.example",
                "locked@two.example",
                "boom@three.example",
                "b@four.example",
            ])
            .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].as_ref().expect("ok").verdict, Verdict::Valid);
        let failure = outcomes[1].as_ref().expect_err("unauthorized");
        assert!(failure.is_unauthorized());
        assert_eq!(outcomes[2].as_ref().expect("ok").verdict, Verdict::Error);
        assert_eq!(outcomes[3].as_ref().expect("ok").verdict, Verdict::Valid);

        assert!(runner.cache().get("locked@two.example").is_none());
        let stats = runner.stats().snapshot();
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.error, 1);
    }

    #[tokio::test]
    async fn empty_input_is_empty_output() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::verified());
        let outcomes = runner(dns, smtp, 5).run(Vec::<String>::new()).await;
        assert!(outcomes.is_empty());
    }

    #[derive(Default)]
    struct CountingSink {
        records: AtomicUsize,
        flushes: AtomicUsize,
    }

    impl ResultSink for CountingSink {
        fn record(&self, _: &ProbeResult) -> io::Result<()> {
            self.records.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&self) -> io::Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_is_flushed_once_per_batch() {
        let dns = Arc::new(StubResolver::answering());
        let smtp = Arc::new(StubProber::verified());
        let sink = Arc::new(CountingSink::default());
        let runner = runner(dns, smtp, 4).with_sink(Arc::clone(&sink) as Arc<dyn ResultSink>);

        runner.run(addresses(9)).await;
        assert_eq!(sink.records.load(Ordering::SeqCst), 9);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }
}
