//! Core domain types and service traits for the exporter
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Aggregated statistics reported by one probe batch for a single target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeStats {
    /// Number of echo requests sent.
    pub sent: u64,
    /// Number of echo replies received.
    pub received: u64,
    /// Packet loss as a percentage in `[0, 100]`.
    pub loss_percent: f64,
    /// Minimum round-trip latency in milliseconds.
    pub min_latency_ms: f64,
    /// Average round-trip latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Maximum round-trip latency in milliseconds.
    pub max_latency_ms: f64,
}

/// The outcome of probing a single target within one batch.
///
/// `Unreachable` covers targets whose report line carried no latency
/// figures at all (every packet was lost).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    Reply(ProbeStats),
    Unreachable,
}

/// Errors that abort an entire probe batch.
///
/// These are recoverable at the process level: the collection loop logs
/// them, skips the cycle's metric writes, and keeps ticking.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch probe utility {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("probe utility exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Probes a batch of addresses and reports per-target statistics.
///
/// The whole address list is probed in one invocation; an error means the
/// batch as a whole produced no usable results.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probes every address in `addresses` once.
    ///
    /// # Returns
    /// * `Ok(map)` keyed by address. Addresses whose report line could not
    ///   be parsed are simply absent from the map.
    /// * `Err` if the utility could not be launched or timed out.
    async fn probe(&self, addresses: &[String]) -> Result<HashMap<String, ProbeOutcome>, ProbeError>;
}
