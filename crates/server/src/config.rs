//! Service configuration

use anyhow::{Context, Result};
use forecast_lib::registry::RegistryConfig;
use forecast_lib::ResolverConfig;
use serde::Deserialize;
use std::time::Duration;

/// Prefix of environment overrides, e.g. `FORECAST_PORT`
const ENV_PREFIX: &str = "FORECAST";

/// Forecasting API configuration
///
/// Read from `config/forecast.*` when present, then from `FORECAST_*`
/// environment variables (e.g. `FORECAST_TRACKING_URI`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address the API binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the Prometheus exporter
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// MLflow tracking server
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,

    /// Registered model promoted to the Production stage
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Experiment searched when no production model exists
    #[serde(default = "default_experiment_id")]
    pub experiment_id: String,

    /// Artifact directory the training job logs the model under
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,

    /// ONNX file inside the artifact directory
    #[serde(default = "default_model_file")]
    pub model_file: String,

    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: usize,

    /// Timeout for each registry request in seconds
    #[serde(default = "default_registry_timeout")]
    pub registry_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_metrics_port() -> u16 {
    9100
}

fn default_tracking_uri() -> String {
    "http://mlflow:5000".to_string()
}

fn default_model_name() -> String {
    "energy_forecasting_model".to_string()
}

fn default_experiment_id() -> String {
    "1".to_string()
}

fn default_artifact_path() -> String {
    "model".to_string()
}

fn default_model_file() -> String {
    "model.onnx".to_string()
}

fn default_max_artifact_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_registry_timeout() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_port: default_metrics_port(),
            tracking_uri: default_tracking_uri(),
            model_name: default_model_name(),
            experiment_id: default_experiment_id(),
            artifact_path: default_artifact_path(),
            model_file: default_model_file(),
            max_artifact_bytes: default_max_artifact_bytes(),
            registry_timeout_secs: default_registry_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from config file and environment
    pub fn load() -> Result<Self> {
        Self::load_with_env(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/forecast").required(false))
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }

    pub fn registry(&self) -> RegistryConfig {
        RegistryConfig {
            tracking_uri: self.tracking_uri.clone(),
            artifact_path: self.artifact_path.clone(),
            model_file: self.model_file.clone(),
            max_artifact_bytes: self.max_artifact_bytes,
            request_timeout: Duration::from_secs(self.registry_timeout_secs),
        }
    }

    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            model_name: self.model_name.clone(),
            experiment_id: self.experiment_id.clone(),
            ..ResolverConfig::default()
        }
    }
}
