//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per strategy and mode
//! - Wire up middleware (request ID, tracing, whole-request timeout)
//! - Bind server to listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppConfig, BatchConfig};
use crate::http::request::{self, LoopParams, X_REQUEST_ID};
use crate::http::response::{single_response, ApiError};
use crate::orchestrator::{BatchReport, Mode, Orchestrator};
use crate::resilience::BreakerSnapshot;
use crate::upstream::{HttpUpstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub batch: BatchConfig,
}

/// Startup and serving failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid upstream: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP front end for the orchestrator.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Build the upstream client, the strategies and the router from `config`.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        let orchestrator = Arc::new(Orchestrator::from_config(&config, upstream));
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    /// Serve an already-built orchestrator.
    pub fn with_orchestrator(config: AppConfig, orchestrator: Arc<Orchestrator>) -> Self {
        let state = AppState {
            orchestrator,
            batch: config.batch,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The whole-request timeout covers single calls only. A batch runs
    /// its calls to completion, however long their backoff takes.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let single_calls = Router::new()
            .route("/direct", get(direct))
            .route("/breaker", get(breaker))
            .route("/breaker/status", get(breaker_status))
            .route("/retry", get(retry))
            .route("/health", get(health))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )));

        let batches = Router::new()
            .route("/direct/loop", get(direct_loop))
            .route("/breaker/loop", get(breaker_loop))
            .route("/retry/loop", get(retry_loop));

        Router::new()
            .merge(single_calls)
            .merge(batches)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        let request_id = req
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-");
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(request::propagate_request_id_layer()),
            )
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = self.config.listener.bind_address.clone();
        TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with state and middleware applied.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn single(state: &AppState, mode: Mode) -> Response {
    single_response(state.orchestrator.single(mode).await)
}

async fn batch(
    state: &AppState,
    mode: Mode,
    params: Result<Query<LoopParams>, QueryRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    let count = request::resolve_count(params.map(|Query(p)| p), &state.batch)?;
    Ok(Json(state.orchestrator.batch(mode, count).await))
}

async fn direct(State(state): State<AppState>) -> Response {
    single(&state, Mode::Direct).await
}

async fn direct_loop(
    State(state): State<AppState>,
    params: Result<Query<LoopParams>, QueryRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    batch(&state, Mode::Direct, params).await
}

async fn breaker(State(state): State<AppState>) -> Response {
    single(&state, Mode::Breaker).await
}

async fn breaker_loop(
    State(state): State<AppState>,
    params: Result<Query<LoopParams>, QueryRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    batch(&state, Mode::Breaker, params).await
}

async fn breaker_status(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    Json(state.orchestrator.breaker_snapshot())
}

async fn retry(State(state): State<AppState>) -> Response {
    single(&state, Mode::Retry).await
}

async fn retry_loop(
    State(state): State<AppState>,
    params: Result<Query<LoopParams>, QueryRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    batch(&state, Mode::Retry, params).await
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
