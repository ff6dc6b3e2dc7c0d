#![allow(dead_code)]

pub mod app;
pub mod mock_prober;

use fping_exporter::exporter::ProbeMetrics;

/// Looks up the current value of a gauge or counter series by family name
/// and label set. Returns `None` when no matching series exists.
pub fn metric_value(metrics: &ProbeMetrics, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    for family in metrics.registry().gather() {
        if family.get_name() != name {
            continue;
        }
        'metric: for metric in family.get_metric() {
            for (key, value) in labels {
                let found = metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == *key && pair.get_value() == *value);
                if !found {
                    continue 'metric;
                }
            }
            if metric.has_gauge() {
                return Some(metric.get_gauge().get_value());
            }
            if metric.has_counter() {
                return Some(metric.get_counter().get_value());
            }
        }
    }
    None
}

/// Counts every series (across all families) carrying the given target label.
pub fn series_count_for_target(metrics: &ProbeMetrics, target: &str) -> usize {
    metrics
        .registry()
        .gather()
        .iter()
        .flat_map(|family| family.get_metric().iter())
        .filter(|metric| {
            metric
                .get_label()
                .iter()
                .any(|pair| pair.get_name() == "target" && pair.get_value() == target)
        })
        .count()
}
