//! Forecast Server - Energy consumption forecasting API
//!
//! Resolves a model from the MLflow registry at startup, then serves
//! forecasts until interrupted.

use anyhow::Result;
use forecast_lib::{PredictionService, ServingMetrics, StructuredLogger};
use forecast_server::{api, config::ServiceConfig, startup};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "forecast-api";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting forecast-server");

    let config = ServiceConfig::load()?;
    info!(
        addr = %config.api_addr(),
        tracking_uri = %config.tracking_uri,
        model_name = %config.model_name,
        experiment_id = %config.experiment_id,
        "Service configured"
    );

    let logger = StructuredLogger::new(SERVICE_NAME);
    let metrics = ServingMetrics::new();

    // Resolution completes before any listener is bound
    let resolved = Arc::new(startup::resolve_model(&config, &logger).await);
    metrics.set_model_info(resolved.model_version(), resolved.outcome().source());

    let service = PredictionService::new(resolved, metrics.clone(), logger.clone());
    let app_state = Arc::new(api::AppState::new(
        service,
        metrics,
        config.tracking_uri.clone(),
    ));

    let metrics_addr = config.metrics_addr();
    tokio::spawn(async move {
        if let Err(e) = api::serve_metrics(metrics_addr).await {
            warn!(error = %e, "Metrics exporter stopped");
        }
    });

    let api_addr = config.api_addr();
    logger.log_startup(SERVICE_VERSION, &api_addr, &config.tracking_uri);

    let shutdown_logger = logger.clone();
    api::serve(&api_addr, app_state, async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown_logger.log_shutdown("SIGINT received"),
            Err(e) => {
                warn!(error = %e, "Could not listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    })
    .await?;

    info!("Shut down");
    Ok(())
}
