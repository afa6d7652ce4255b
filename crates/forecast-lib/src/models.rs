//! Wire types shared by the forecasting API and its clients

use serde::{Deserialize, Serialize};

/// Endpoints exposed by the forecasting API, in the order they are advertised
pub const ENDPOINTS: [&str; 4] = ["/health", "/predict", "/metrics", "/info"];

/// Successful forecast for a batch of input sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// One forecast row per input sequence
    pub predictions: Vec<Vec<f32>>,
    pub model_version: String,
}

/// Error body returned for rejected or failed predictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

/// Body of `GET /info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub model_version: String,
    pub model_loaded: bool,
    pub tracking_uri: String,
    pub endpoints: Vec<String>,
}

/// Body returned for unknown routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotFoundResponse {
    pub error: String,
    pub available_endpoints: Vec<String>,
}

impl NotFoundResponse {
    pub fn new() -> Self {
        Self {
            error: "Endpoint not found".to_string(),
            available_endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for NotFoundResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata of a training run as reported by the model registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    /// Start time in milliseconds since the Unix epoch
    pub start_time: i64,
    #[serde(default)]
    pub status: Option<String>,
}
