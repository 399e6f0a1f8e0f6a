//! HTTP surface hosting both pipeline stages.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::collector::TrainerTrigger;
use crate::collector::trigger;
use crate::config::PipelineConfig;

/// Paths answering with a collection run.
pub const COLLECT_ROUTES: [&str; 3] = [
    "/api/collect",
    "/api/collecting_n_processing",
    "/api/process-data",
];
/// Paths accepting a training handoff.
pub const TRAIN_ROUTES: [&str; 3] = [
    "/api/train",
    "/api/process_ml_pipeline",
    "/api/process-ml-pipeline",
];

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub trigger: Arc<dyn TrainerTrigger>,
}

impl AppState {
    /// State using the trigger selected by the configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let trigger = trigger::from_config(&config);
        Self {
            config: Arc::new(config),
            trigger,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new().route("/health", get(routes::health));
    for path in COLLECT_ROUTES {
        router = router.route(path, get(routes::collect).post(routes::collect));
    }
    for path in TRAIN_ROUTES {
        router = router.route(path, post(routes::train));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind the configured address and serve until the process stops.
pub async fn serve(config: PipelineConfig) -> Result<(), ServerError> {
    let addr = config.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_with_listener(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve_with_listener(
    listener: TcpListener,
    config: PipelineConfig,
) -> Result<(), ServerError> {
    let local = listener.local_addr().map_err(ServerError::Serve)?;
    info!(
        addr = %local,
        variant = %config.variant,
        output_dir = %config.output_dir.display(),
        "mlpipe v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    axum::serve(listener, router(AppState::new(config)))
        .await
        .map_err(ServerError::Serve)
}
