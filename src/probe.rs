//! Batch ICMP probing via the external `fping` utility.
//!
//! One `fping` process is spawned per collection cycle for the whole
//! address list, which amortizes process-startup cost across targets. The
//! quiet-mode summary (`-q`) is written per target on a single line; those
//! lines are parsed here into [`ProbeOutcome`]s. Lines that do not match
//! the report grammar are logged and skipped rather than failing the batch.

use crate::config::ProbeConfig;
use crate::core::{ProbeError, ProbeOutcome, ProbeStats, Prober};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

/// Slack added on top of `packet_count x per_packet_timeout` before the
/// invocation is killed. Covers process startup and fping's inter-packet
/// pacing.
const DEADLINE_OVERHEAD: Duration = Duration::from_secs(5);

// Example summary lines, as emitted by `fping -q -c5`:
//   8.8.8.8 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 12.3/14.1/15.5
//   10.0.0.1 : xmt/rcv/%loss = 5/0/100%
static REPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<addr>\S+)\s*:\s*xmt/rcv/%loss = (?P<sent>\d+)/(?P<recv>\d+)/(?P<loss>\d+(?:\.\d+)?)%(?:,\s*min/avg/max = (?P<min>\d+(?:\.\d+)?)/(?P<avg>\d+(?:\.\d+)?)/(?P<max>\d+(?:\.\d+)?))?\s*$",
    )
    .expect("report line regex is valid")
});

/// Probes targets by invoking `fping` once per batch.
pub struct FpingProber {
    path: PathBuf,
    packet_count: u32,
    per_packet_timeout: Duration,
}

impl FpingProber {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.fping_path.clone(),
            packet_count: config.packet_count,
            per_packet_timeout: Duration::from_millis(config.per_packet_timeout_ms),
        }
    }

    /// Upper bound on how long one invocation may run before it is killed.
    fn deadline(&self) -> Duration {
        self.per_packet_timeout * self.packet_count + DEADLINE_OVERHEAD
    }
}

#[async_trait]
impl Prober for FpingProber {
    async fn probe(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ProbeOutcome>, ProbeError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let mut command = Command::new(&self.path);
        command
            .arg(format!("-c{}", self.packet_count))
            .arg(format!("-t{}", self.per_packet_timeout.as_millis()))
            .arg("-q")
            .args(addresses)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let deadline = self.deadline();
        let output = match timeout(deadline, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ProbeError::Spawn {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(_) => return Err(ProbeError::DeadlineExceeded(deadline)),
        };

        // fping exits non-zero when any target was lossy, and writes the
        // quiet-mode report to stderr. Parse both streams combined.
        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push('\n');
        report.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(parse_report(&report))
    }
}

/// Parses a full quiet-mode report into per-address outcomes.
///
/// Unparseable report lines are logged and skipped; the affected target is
/// simply absent from the returned map.
pub fn parse_report(report: &str) -> HashMap<String, ProbeOutcome> {
    let mut outcomes = HashMap::new();
    for line in report.lines() {
        let line = line.trim();
        if !line.contains("xmt/rcv/%loss") {
            // ICMP error chatter and blank lines, not a summary.
            continue;
        }
        match parse_line(line) {
            Some((address, outcome)) => {
                outcomes.insert(address, outcome);
            }
            None => warn!(line, "skipping unparseable probe report line"),
        }
    }
    outcomes
}

fn parse_line(line: &str) -> Option<(String, ProbeOutcome)> {
    let caps = REPORT_LINE.captures(line)?;
    let address = caps.name("addr")?.as_str().to_string();
    let sent: u64 = caps.name("sent")?.as_str().parse().ok()?;
    let received: u64 = caps.name("recv")?.as_str().parse().ok()?;
    let loss_percent: f64 = caps.name("loss")?.as_str().parse().ok()?;

    // A line without the min/avg/max section means no replies came back.
    let outcome = match (caps.name("min"), caps.name("avg"), caps.name("max")) {
        (Some(min), Some(avg), Some(max)) => ProbeOutcome::Reply(ProbeStats {
            sent,
            received,
            loss_percent,
            min_latency_ms: min.as_str().parse().ok()?,
            avg_latency_ms: avg.as_str().parse().ok()?,
            max_latency_ms: max.as_str().parse().ok()?,
        }),
        _ => ProbeOutcome::Unreachable,
    };
    Some((address, outcome))
}
