//! A scriptable `Prober` double for scheduler and API tests.

use async_trait::async_trait;
use fping_exporter::core::{ProbeError, ProbeOutcome, ProbeStats, Prober};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A healthy default result for any probed address.
pub fn healthy_stats() -> ProbeStats {
    ProbeStats {
        sent: 5,
        received: 5,
        loss_percent: 0.0,
        min_latency_ms: 1.0,
        avg_latency_ms: 2.0,
        max_latency_ms: 3.0,
    }
}

/// Mock prober: counts invocations, optionally sleeps to simulate a slow
/// batch, optionally fails its first N calls, and returns scripted
/// outcomes (healthy by default).
pub struct MockProber {
    pub calls: AtomicUsize,
    delay: Option<Duration>,
    fail_remaining: AtomicUsize,
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    omitted: Mutex<HashSet<String>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
            fail_remaining: AtomicUsize::new(0),
            outcomes: Mutex::new(HashMap::new()),
            omitted: Mutex::new(HashSet::new()),
        }
    }

    /// Scripts a specific outcome for one address.
    pub fn with_outcome(self, address: &str, outcome: ProbeOutcome) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(address.to_string(), outcome);
        self
    }

    /// Omits an address from the result map entirely, as if its report
    /// line failed to parse.
    pub fn omitting(self, address: &str) -> Self {
        self.omitted.lock().unwrap().insert(address.to_string());
        self
    }

    /// Makes every probe call sleep for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes the first `count` probe calls fail with a deadline error.
    pub fn failing(self, count: usize) -> Self {
        self.fail_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for MockProber {
    async fn probe(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ProbeOutcome>, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ProbeError::DeadlineExceeded(Duration::from_secs(1)));
        }

        let scripted = self.outcomes.lock().unwrap();
        let omitted = self.omitted.lock().unwrap();
        Ok(addresses
            .iter()
            .filter(|address| !omitted.contains(*address))
            .map(|address| {
                let outcome = scripted
                    .get(address)
                    .copied()
                    .unwrap_or(ProbeOutcome::Reply(healthy_stats()));
                (address.clone(), outcome)
            })
            .collect())
    }
}
