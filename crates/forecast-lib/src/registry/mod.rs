//! Model registry access
//!
//! This module provides:
//! - The [`ModelRegistry`] capability consumed by the resolver
//! - An MLflow REST implementation that downloads ONNX artifacts

mod mlflow;


pub use mlflow::{MlflowRegistry, RegistryConfig};

use crate::models::RunInfo;
use crate::predictor::{ModelError, ModelHandle};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Registry stage that marks the serving model
pub const PRODUCTION_STAGE: &str = "Production";

/// Errors returned by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid registry URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0} not found in registry")]
    NotFound(String),

    #[error("artifact of {size} bytes exceeds limit of {max} bytes")]
    ArtifactTooLarge { size: usize, max: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Operations the resolver needs from a model registry
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Load the model version of `model_name` currently in the Production stage
    async fn load_production_model(
        &self,
        model_name: &str,
    ) -> Result<Arc<dyn ModelHandle>, RegistryError>;

    /// List runs of an experiment, most recently started first
    async fn search_runs(
        &self,
        experiment_id: &str,
        max_results: usize,
    ) -> Result<Vec<RunInfo>, RegistryError>;

    /// Load the model artifact logged by a run
    async fn load_run_model(&self, run_id: &str) -> Result<Arc<dyn ModelHandle>, RegistryError>;
}
