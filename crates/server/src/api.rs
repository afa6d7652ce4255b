//! HTTP API for forecasts, health and model info

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use forecast_lib::{
    models::{InfoResponse, NotFoundResponse, ENDPOINTS},
    HealthResponse, PredictError, PredictionService, ServingMetrics,
};
use prometheus::{Encoder, TextEncoder};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub metrics: ServingMetrics,
    pub tracking_uri: String,
}

impl AppState {
    pub fn new(service: PredictionService, metrics: ServingMetrics, tracking_uri: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            metrics,
            tracking_uri: tracking_uri.into(),
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse::snapshot(state.service.resolved())),
    )
}

async fn info_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resolved = state.service.resolved();
    let body = InfoResponse {
        model_version: resolved.model_version().to_string(),
        model_loaded: resolved.is_loaded(),
        tracking_uri: state.tracking_uri.clone(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    };
    (StatusCode::OK, Json(body))
}

/// Run a prediction on the blocking pool; inference is CPU-bound
async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let start = Instant::now();
    let service = state.service.clone();

    let result = tokio::task::spawn_blocking(move || service.predict(&body))
        .await
        .unwrap_or_else(|e| Err(PredictError::TaskFailed(e.to_string())));

    state
        .metrics
        .observe_predict_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(response) => {
            state.metrics.inc_predict_requests("success");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            let outcome = if err.is_client_error() {
                "client_error"
            } else {
                "server_error"
            };
            state.metrics.inc_predict_requests(outcome);
            state.service.report_failure(&err);
            error_response(&err)
        }
    }
}

fn error_response(err: &PredictError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_response())).into_response()
}

/// Prometheus owns exposition on its own port; the API keeps the path reserved
async fn metrics_placeholder() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(NotFoundResponse::new()))
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_placeholder))
        .fallback(not_found)
        .with_state(state)
}

/// Create the router of the Prometheus exporter
pub fn create_metrics_router() -> Router {
    Router::new().route("/metrics", get(prometheus_metrics))
}

/// Start the API server; returns once `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Start the Prometheus exporter
pub async fn serve_metrics(addr: String) -> anyhow::Result<()> {
    info!(addr = %addr, "Starting metrics exporter");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_metrics_router()).await?;

    Ok(())
}
