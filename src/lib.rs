//! fping-exporter - ICMP latency and packet-loss exporter
//!
//! This library periodically probes a runtime-managed set of targets with
//! batched ICMP echoes (via the external `fping` utility), aggregates the
//! per-target statistics, and exposes them for Prometheus scraping. The
//! target list is managed through a small HTTP CRUD API and persisted to a
//! JSON file across restarts.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod exporter;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
