//! Health reporting for liveness probes

use crate::resolver::ResolvedModel;
use serde::{Deserialize, Serialize};

/// Service status reported by `/health`
///
/// The service answers requests in every resolution state, dummy mode
/// included, so it only ever reports itself healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
}

/// Whether forecasts come from a real model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Loaded,
    Dummy,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub model: ModelState,
    pub model_version: String,
    /// UTC, ISO-8601 with a trailing `Z`
    pub timestamp: String,
}

impl HealthResponse {
    pub fn snapshot(resolved: &ResolvedModel) -> Self {
        let model = if resolved.is_loaded() {
            ModelState::Loaded
        } else {
            ModelState::Dummy
        };

        Self {
            status: ServiceStatus::Healthy,
            model,
            model_version: resolved.model_version().to_string(),
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                .to_string(),
        }
    }
}
