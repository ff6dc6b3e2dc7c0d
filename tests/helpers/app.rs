//! Spawns a full application instance on ephemeral ports for HTTP tests.

use fping_exporter::{
    app::App,
    config::{ApiConfig, Config, MetricsConfig, ProbeConfig, TargetsConfig},
    core::Prober,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct TestApp {
    pub metrics_addr: SocketAddr,
    pub api_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    run_handle: JoinHandle<()>,
    // Owns the targets file for the app's lifetime.
    _dir: TempDir,
}

/// Test configuration: ephemeral ports, a temp targets file, and the
/// shortest legal collection interval.
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        log_level: "info".to_string(),
        probe: ProbeConfig {
            fping_path: "/usr/bin/fping".into(),
            packet_count: 1,
            per_packet_timeout_ms: 100,
            interval_seconds: 1,
        },
        metrics: MetricsConfig {
            listen_address: "127.0.0.1:0".parse().unwrap(),
        },
        api: ApiConfig {
            listen_address: "127.0.0.1:0".parse().unwrap(),
        },
        targets: TargetsConfig {
            file: dir.path().join("targets.json"),
        },
    }
}

pub async fn spawn_app(prober: Arc<dyn Prober>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(config)
        .prober_override(prober)
        .build(shutdown_rx)
        .await
        .expect("app should build");

    let metrics_addr = app.metrics_addr();
    let api_addr = app.api_addr();
    let run_handle = tokio::spawn(async move {
        let _ = app.run().await;
    });

    TestApp {
        metrics_addr,
        api_addr,
        shutdown_tx,
        run_handle,
        _dir: dir,
    }
}

impl TestApp {
    pub fn api_url(&self, path: &str) -> String {
        format!("http://{}{}", self.api_addr, path)
    }

    pub fn metrics_url(&self) -> String {
        format!("http://{}/metrics", self.metrics_addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.run_handle.await;
    }
}
