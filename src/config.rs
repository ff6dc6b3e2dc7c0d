//! Configuration management for the exporter
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `fping-exporter.toml` file and merge
//! it with environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// A fatal configuration problem. The process must not start serving with
/// any of these present.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("probe.packet_count must be at least 1")]
    InvalidPacketCount,
    #[error("probe.per_packet_timeout_ms must be at least 1")]
    InvalidTimeout,
    #[error("probe.interval_seconds must be at least 1")]
    InvalidInterval,
    #[error("probe utility not found at {0}")]
    ProbeUtilityNotFound(PathBuf),
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the external probe invocation.
    pub probe: ProbeConfig,
    /// Configuration for the Prometheus metrics endpoint.
    pub metrics: MetricsConfig,
    /// Configuration for the target management API.
    pub api: ApiConfig,
    /// Configuration for target-list persistence.
    pub targets: TargetsConfig,
}

/// Configuration for the external probe invocation.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProbeConfig {
    /// Path to the `fping` binary.
    pub fping_path: PathBuf,
    /// Echo requests sent per target per cycle.
    pub packet_count: u32,
    /// Per-packet reply timeout in milliseconds.
    pub per_packet_timeout_ms: u64,
    /// Seconds between collection cycles.
    pub interval_seconds: u64,
}

/// Configuration for the Prometheus metrics endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Address the `/metrics` server binds to.
    pub listen_address: SocketAddr,
}

/// Configuration for the target management API.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Address the management API binds to.
    pub listen_address: SocketAddr,
}

/// Configuration for target-list persistence.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TargetsConfig {
    /// Path to the persisted JSON array of target addresses. A missing
    /// file means an empty initial list.
    pub file: PathBuf,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// TOML file, `FPING_EXPORTER_`-prefixed environment variables, and
    /// command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        figment = match &cli.config {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file("fping-exporter.toml")),
        };
        let config = figment
            // Nested keys use a double underscore, e.g.
            // FPING_EXPORTER_PROBE__PACKET_COUNT=10
            .merge(Env::prefixed("FPING_EXPORTER_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }

    /// Validates settings that would make the process misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.packet_count == 0 {
            return Err(ConfigError::InvalidPacketCount);
        }
        if self.probe.per_packet_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.probe.interval_seconds == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if !self.probe.fping_path.is_file() {
            return Err(ConfigError::ProbeUtilityNotFound(
                self.probe.fping_path.clone(),
            ));
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            probe: ProbeConfig {
                fping_path: PathBuf::from("/usr/bin/fping"),
                packet_count: 5,
                per_packet_timeout_ms: 500,
                interval_seconds: 15,
            },
            metrics: MetricsConfig {
                listen_address: "0.0.0.0:8000".parse().expect("valid default address"),
            },
            api: ApiConfig {
                listen_address: "0.0.0.0:8080".parse().expect("valid default address"),
            },
            targets: TargetsConfig {
                file: PathBuf::from("targets.json"),
            },
        }
    }
}
