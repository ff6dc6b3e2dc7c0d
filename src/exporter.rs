//! Prometheus series management for probe results.
//!
//! [`ProbeMetrics`] owns the exporter's `prometheus::Registry` and every
//! per-target gauge family. Series lifecycle follows the target registry:
//! values are overwritten on each collection cycle, and every series for a
//! target is deleted when that target is removed. A cycle that fails to
//! produce a result for a target forces its loss series to 100% while
//! leaving latency series at their last known value, so outages show up on
//! dashboards immediately instead of as stale healthy numbers.

use crate::core::ProbeStats;
use prometheus::{Gauge, GaugeVec, IntCounter, Opts, Registry, TextEncoder};
use tracing::error;

/// Statistic-kind values for the latency gauge's `type` label.
const LATENCY_TYPES: [&str; 3] = ["min", "avg", "max"];

/// Handle to every exported metric family.
#[derive(Clone)]
pub struct ProbeMetrics {
    registry: Registry,
    latency_ms: GaugeVec,
    loss_percent: GaugeVec,
    packets_sent: GaugeVec,
    packets_received: GaugeVec,
    packets_lost: GaugeVec,
    loop_duration_seconds: Gauge,
    collector_errors: IntCounter,
}

impl ProbeMetrics {
    /// Creates all metric families and registers them on a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let latency_ms = GaugeVec::new(
            Opts::new("fping_latency_ms", "Round-trip latency in milliseconds"),
            &["target", "type"],
        )?;
        let loss_percent = GaugeVec::new(
            Opts::new("fping_loss_percent", "Packet loss percentage"),
            &["target"],
        )?;
        let packets_sent = GaugeVec::new(
            Opts::new(
                "fping_packets_sent",
                "ICMP echo requests sent in the last collection cycle",
            ),
            &["target"],
        )?;
        let packets_received = GaugeVec::new(
            Opts::new(
                "fping_packets_received",
                "ICMP echo replies received in the last collection cycle",
            ),
            &["target"],
        )?;
        let packets_lost = GaugeVec::new(
            Opts::new(
                "fping_packets_lost",
                "ICMP echo requests unanswered in the last collection cycle",
            ),
            &["target"],
        )?;
        let loop_duration_seconds = Gauge::new(
            "fping_collector_loop_duration_seconds",
            "Wall-clock duration of the last collection cycle",
        )?;
        let collector_errors = IntCounter::new(
            "fping_collector_errors_total",
            "Total number of collection cycles aborted by a probe failure",
        )?;

        registry.register(Box::new(latency_ms.clone()))?;
        registry.register(Box::new(loss_percent.clone()))?;
        registry.register(Box::new(packets_sent.clone()))?;
        registry.register(Box::new(packets_received.clone()))?;
        registry.register(Box::new(packets_lost.clone()))?;
        registry.register(Box::new(loop_duration_seconds.clone()))?;
        registry.register(Box::new(collector_errors.clone()))?;

        Ok(Self {
            registry,
            latency_ms,
            loss_percent,
            packets_sent,
            packets_received,
            packets_lost,
            loop_duration_seconds,
            collector_errors,
        })
    }

    /// Overwrites every series for `target` with this cycle's statistics.
    pub fn record_result(&self, target: &str, stats: &ProbeStats) {
        self.latency_ms
            .with_label_values(&[target, "min"])
            .set(stats.min_latency_ms);
        self.latency_ms
            .with_label_values(&[target, "avg"])
            .set(stats.avg_latency_ms);
        self.latency_ms
            .with_label_values(&[target, "max"])
            .set(stats.max_latency_ms);
        self.loss_percent
            .with_label_values(&[target])
            .set(stats.loss_percent);
        self.packets_sent
            .with_label_values(&[target])
            .set(stats.sent as f64);
        self.packets_received
            .with_label_values(&[target])
            .set(stats.received as f64);
        self.packets_lost
            .with_label_values(&[target])
            .set(stats.sent.saturating_sub(stats.received) as f64);
    }

    /// Marks a target whose probe produced no usable result this cycle.
    /// Latency series keep their last known value.
    pub fn record_failure(&self, target: &str) {
        self.loss_percent.with_label_values(&[target]).set(100.0);
    }

    /// Deletes every series associated with `target`. Idempotent: series
    /// that never existed are ignored.
    pub fn delete_target(&self, target: &str) {
        for kind in LATENCY_TYPES {
            let _ = self.latency_ms.remove_label_values(&[target, kind]);
        }
        let _ = self.loss_percent.remove_label_values(&[target]);
        let _ = self.packets_sent.remove_label_values(&[target]);
        let _ = self.packets_received.remove_label_values(&[target]);
        let _ = self.packets_lost.remove_label_values(&[target]);
    }

    /// Records the wall-clock duration of the last collection cycle.
    pub fn record_loop_duration(&self, seconds: f64) {
        self.loop_duration_seconds.set(seconds);
    }

    /// Counts a collection cycle aborted by a probe execution failure.
    pub fn record_cycle_error(&self) {
        self.collector_errors.inc();
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        match TextEncoder::new().encode_to_string(&self.registry.gather()) {
            Ok(body) => body,
            Err(e) => {
                error!("failed to encode metrics: {e}");
                String::new()
            }
        }
    }

    /// The underlying registry, for direct inspection in tests.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
