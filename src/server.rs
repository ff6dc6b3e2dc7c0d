//! HTTP surfaces: the Prometheus scrape endpoint and the target
//! management API.
//!
//! Both are small axum routers served from pre-bound listeners so tests
//! can bind port 0 and discover the address. Each serve loop races the
//! shutdown signal against `axum::serve` and terminates cleanly on either.

use crate::exporter::ProbeMetrics;
use crate::registry::{RegistryError, TargetRegistry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, trace};

/// Shared state for the management API handlers.
///
/// The handlers own both the registry and the exporter because target
/// removal must cascade to series deletion; the registry itself knows
/// nothing about metrics.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<TargetRegistry>,
    pub metrics: Arc<ProbeMetrics>,
}

/// An HTTP server bound to an existing listener, stopped by the shutdown
/// signal.
pub struct HttpServer {
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpServer {
    pub fn new(
        name: &'static str,
        listener: TcpListener,
        router: Router,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            name,
            listener,
            router,
            shutdown_rx,
        }
    }

    /// Returns a future that serves requests until shutdown.
    pub fn run(mut self) -> impl Future<Output = ()> {
        async move {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    trace!(server = self.name, "server received shutdown signal");
                }
                result = axum::serve(self.listener, self.router.into_make_service()) => {
                    if let Err(e) = result {
                        error!(server = self.name, "server error: {e}");
                    }
                }
            }
            trace!(server = self.name, "server task finished");
        }
    }
}

/// Router for the Prometheus scrape endpoint.
pub fn metrics_router(metrics: Arc<ProbeMetrics>) -> Router {
    Router::new().route("/metrics", get(move || async move { metrics.render() }))
}

/// Router for the target management API.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/targets", get(list_targets).post(add_target))
        .route(
            "/targets/{address}",
            delete(remove_target).put(rename_target),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct TargetListBody {
    targets: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct TargetBody {
    address: String,
}

async fn list_targets(State(state): State<ApiState>) -> Json<TargetListBody> {
    Json(TargetListBody {
        targets: state.registry.list().await,
    })
}

async fn add_target(
    State(state): State<ApiState>,
    Json(body): Json<TargetBody>,
) -> Result<(StatusCode, Json<TargetBody>), ApiError> {
    state.registry.add(&body.address).await?;
    Ok((
        StatusCode::CREATED,
        Json(TargetBody {
            address: body.address.trim().to_string(),
        }),
    ))
}

async fn rename_target(
    State(state): State<ApiState>,
    Path(old): Path<String>,
    Json(body): Json<TargetBody>,
) -> Result<Json<TargetBody>, ApiError> {
    state.registry.rename(&old, &body.address).await?;
    // The old address no longer exists; drop its series rather than leave
    // them stale under the previous label.
    state.metrics.delete_target(&old);
    Ok(Json(TargetBody {
        address: body.address.trim().to_string(),
    }))
}

async fn remove_target(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.remove(&address).await?;
    state.metrics.delete_target(&address);
    Ok(StatusCode::NO_CONTENT)
}

/// Maps registry errors onto HTTP statuses with a short reason body.
struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RegistryError::EmptyAddress => StatusCode::BAD_REQUEST,
            RegistryError::AlreadyExists(_) => StatusCode::CONFLICT,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Persistence(_) | RegistryError::Decode(_) => {
                error!("registry persistence failure: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
