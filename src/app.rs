//! The main application wiring, decoupled from the entry point.

use crate::{
    config::Config,
    core::Prober,
    exporter::ProbeMetrics,
    probe::FpingProber,
    registry::TargetRegistry,
    scheduler::Collector,
    server::{api_router, metrics_router, ApiState, HttpServer},
    task_manager::TaskManager,
};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    metrics_addr: SocketAddr,
    api_addr: SocketAddr,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Address the metrics endpoint is actually bound to.
    pub fn metrics_addr(&self) -> SocketAddr {
        self.metrics_addr
    }

    /// Address the management API is actually bound to.
    pub fn api_addr(&self) -> SocketAddr {
        self.api_addr
    }

    /// Waits for the shutdown signal and then gracefully awaits all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("shutdown signal received, waiting for tasks");
        self.task_manager.shutdown().await;
        info!("all tasks shut down");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the components from running them, and allows the
/// probe implementation to be overridden for testing.
pub struct AppBuilder {
    config: Config,
    prober_override: Option<Arc<dyn Prober>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            prober_override: None,
        }
    }

    /// Overrides the prober for testing.
    pub fn prober_override(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober_override = Some(prober);
        self
    }

    /// Builds every component, binds the listeners, and spawns all tasks.
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx.clone());

        let registry = Arc::new(TargetRegistry::load(config.targets.file.clone()).await?);
        info!(
            targets = registry.list().await.len(),
            file = %config.targets.file.display(),
            "target registry loaded"
        );

        let metrics = Arc::new(ProbeMetrics::new()?);
        let prober: Arc<dyn Prober> = match self.prober_override {
            Some(prober) => prober,
            None => Arc::new(FpingProber::new(&config.probe)),
        };

        // Bind before spawning so the caller learns the real addresses
        // even when the config asked for port 0.
        let metrics_listener = TcpListener::bind(config.metrics.listen_address).await?;
        let metrics_addr = metrics_listener.local_addr()?;
        let api_listener = TcpListener::bind(config.api.listen_address).await?;
        let api_addr = api_listener.local_addr()?;

        let metrics_server = HttpServer::new(
            "metrics-server",
            metrics_listener,
            metrics_router(metrics.clone()),
            shutdown_rx.clone(),
        );
        task_manager.spawn("metrics-server", metrics_server.run());

        let api_server = HttpServer::new(
            "management-api",
            api_listener,
            api_router(ApiState {
                registry: registry.clone(),
                metrics: metrics.clone(),
            }),
            shutdown_rx.clone(),
        );
        task_manager.spawn("management-api", api_server.run());

        let collector = Arc::new(Collector::new(registry, prober, metrics));
        let interval = Duration::from_secs(config.probe.interval_seconds);
        task_manager.spawn("collector", collector.run(interval, shutdown_rx));

        Ok(App {
            task_manager,
            metrics_addr,
            api_addr,
        })
    }
}
