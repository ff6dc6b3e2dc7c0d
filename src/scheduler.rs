//! The periodic collection loop.
//!
//! Every tick, the collector snapshots the target registry, probes the
//! whole batch once, and writes the results into the exporter. Cycles are
//! single-flight: a tick that fires while the previous cycle is still
//! running is skipped, never queued, so a slow probe cannot pile up
//! concurrent fping processes.

use crate::core::{ProbeOutcome, Prober};
use crate::exporter::ProbeMetrics;
use crate::registry::TargetRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

pub struct Collector {
    registry: Arc<TargetRegistry>,
    prober: Arc<dyn Prober>,
    metrics: Arc<ProbeMetrics>,
    // Held for the duration of one cycle; try-locked on every tick.
    cycle_gate: Arc<Mutex<()>>,
}

impl Collector {
    pub fn new(
        registry: Arc<TargetRegistry>,
        prober: Arc<dyn Prober>,
        metrics: Arc<ProbeMetrics>,
    ) -> Self {
        Self {
            registry,
            prober,
            metrics,
            cycle_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Ticks every `interval` until the shutdown signal fires. The first
    /// tick fires immediately.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_seconds = interval.as_secs_f64(), "collector started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("collector received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    match self.cycle_gate.clone().try_lock_owned() {
                        Ok(gate) => {
                            let collector = self.clone();
                            tokio::spawn(async move {
                                let _gate = gate;
                                collector.run_cycle().await;
                            });
                        }
                        Err(_) => {
                            debug!("previous collection cycle still running, skipping tick");
                        }
                    }
                }
            }
        }
    }

    /// Executes one collection cycle: snapshot targets, probe the batch,
    /// write per-target series, record the loop duration.
    ///
    /// A probe execution failure aborts the cycle without writing any
    /// per-target series; the next tick proceeds normally. The loop
    /// duration gauge is updated either way.
    pub async fn run_cycle(&self) {
        let start = Instant::now();
        let targets = self.registry.list().await;

        if targets.is_empty() {
            debug!("no targets registered, skipping probe");
        } else {
            match self.prober.probe(&targets).await {
                Ok(outcomes) => {
                    // Targets removed (or renamed away) while the probe was
                    // in flight have already had their series deleted; a
                    // late write would resurrect them with nothing left to
                    // clean up. Only write targets still registered.
                    let current: HashSet<String> =
                        self.registry.list().await.into_iter().collect();
                    for target in targets.iter().filter(|t| current.contains(*t)) {
                        match outcomes.get(target) {
                            Some(ProbeOutcome::Reply(stats)) => {
                                self.metrics.record_result(target, stats);
                            }
                            Some(ProbeOutcome::Unreachable) | None => {
                                self.metrics.record_failure(target);
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("collection cycle aborted: {e}");
                    self.metrics.record_cycle_error();
                }
            }
        }

        self.metrics.record_loop_duration(start.elapsed().as_secs_f64());
    }
}
