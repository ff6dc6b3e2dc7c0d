//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `fping-exporter.toml` file and
//! environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// An ICMP latency and packet-loss exporter with a runtime-managed target list.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between collection cycles.
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Path to the fping binary.
    #[arg(long, value_name = "FILE")]
    pub fping_path: Option<PathBuf>,

    /// Address for the Prometheus metrics endpoint.
    #[arg(long, value_name = "ADDR")]
    pub metrics_listen: Option<SocketAddr>,

    /// Address for the target management API.
    #[arg(long, value_name = "ADDR")]
    pub api_listen: Option<SocketAddr>,

    /// Path to the persisted target list.
    #[arg(long, value_name = "FILE")]
    pub targets_file: Option<PathBuf>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(interval) = self.interval {
            dict.insert("probe.interval_seconds".into(), Value::from(interval));
        }

        if let Some(path) = &self.fping_path {
            dict.insert(
                "probe.fping_path".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }

        if let Some(addr) = self.metrics_listen {
            dict.insert(
                "metrics.listen_address".into(),
                Value::from(addr.to_string()),
            );
        }

        if let Some(addr) = self.api_listen {
            dict.insert("api.listen_address".into(), Value::from(addr.to_string()));
        }

        if let Some(path) = &self.targets_file {
            dict.insert(
                "targets.file".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
