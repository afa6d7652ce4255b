//! Observability infrastructure for the forecasting service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request outcomes, served forecasts, model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, GaugeVec, Histogram,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for request latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

struct ServingMetricsInner {
    predict_latency_seconds: Histogram,
    predict_requests: IntCounterVec,
    predictions_served: IntCounterVec,
    model_info: GaugeVec,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            predict_latency_seconds: register_histogram!(
                "forecast_api_predict_latency_seconds",
                "Time spent serving /predict requests",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register predict_latency_seconds"),

            predict_requests: register_int_counter_vec!(
                "forecast_api_predict_requests_total",
                "Prediction requests by outcome",
                &["status"]
            )
            .expect("Failed to register predict_requests"),

            predictions_served: register_int_counter_vec!(
                "forecast_api_predictions_total",
                "Forecast rows served, by source",
                &["source"]
            )
            .expect("Failed to register predictions_served"),

            model_info: register_gauge_vec!(
                "forecast_api_model_info",
                "Information about the model resolved at startup",
                &["version", "source"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Serving metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new)
    }

    pub fn observe_predict_latency(&self, duration_secs: f64) {
        self.inner().predict_latency_seconds.observe(duration_secs);
    }

    /// Count a finished /predict request (`success`, `client_error` or `server_error`)
    pub fn inc_predict_requests(&self, status: &str) {
        self.inner()
            .predict_requests
            .with_label_values(&[status])
            .inc();
    }

    /// Count forecast rows produced by `source` (`model` or `dummy`)
    pub fn add_predictions(&self, source: &str, rows: usize) {
        self.inner()
            .predictions_served
            .with_label_values(&[source])
            .inc_by(rows as u64);
    }

    pub fn set_model_info(&self, version: &str, source: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, source])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Every line carries an `event` field so log pipelines can filter on it.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str, tracking_uri: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            addr = %addr,
            tracking_uri = %tracking_uri,
            "Forecasting API started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Forecasting API shutting down"
        );
    }

    /// One line per resolution tier attempt
    pub fn log_tier_attempt(&self, tier: &str, success: bool, detail: &str) {
        if success {
            info!(
                event = "model_tier_attempt",
                service = %self.service,
                tier = %tier,
                success = true,
                detail = %detail,
                "Model resolution tier succeeded"
            );
        } else {
            warn!(
                event = "model_tier_attempt",
                service = %self.service,
                tier = %tier,
                success = false,
                detail = %detail,
                "Model resolution tier missed"
            );
        }
    }

    pub fn log_resolution(&self, source: &str, model_version: &str) {
        if source == "dummy" {
            warn!(
                event = "model_resolved",
                service = %self.service,
                source = %source,
                model_version = %model_version,
                "No model found, serving dummy predictions"
            );
        } else {
            info!(
                event = "model_resolved",
                service = %self.service,
                source = %source,
                model_version = %model_version,
                "Model resolved"
            );
        }
    }

    pub fn log_prediction(&self, rows: usize, source: &str, model_version: &str) {
        info!(
            event = "prediction_served",
            service = %self.service,
            rows = rows,
            source = %source,
            model_version = %model_version,
            "Prediction successful"
        );
    }

    /// Client errors are logged at warn; server errors at error with the full cause chain
    pub fn log_prediction_failed(&self, error_type: &str, message: &str, detail: &str, server_error: bool) {
        if server_error {
            error!(
                event = "prediction_failed",
                service = %self.service,
                error_type = %error_type,
                message = %message,
                detail = %detail,
                "Unexpected error during prediction"
            );
        } else {
            warn!(
                event = "prediction_failed",
                service = %self.service,
                error_type = %error_type,
                message = %message,
                "Rejected prediction request"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_metrics_creation() {
        // Metrics live in the global Prometheus registry; repeated handles share them
        let metrics = ServingMetrics::new();
        let other = ServingMetrics::new();

        metrics.observe_predict_latency(0.002);
        metrics.inc_predict_requests("success");
        other.add_predictions("dummy", 3);
        other.set_model_info("dummy", "dummy");

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "forecast_api_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("forecast-api");
        assert_eq!(logger.service, "forecast-api");
    }
}
