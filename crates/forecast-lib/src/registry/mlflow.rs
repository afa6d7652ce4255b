//! MLflow tracking server client
//!
//! Talks to the MLflow REST API to find the production model version or the
//! most recent training run, then downloads the run's ONNX artifact.

use super::{ModelRegistry, RegistryError, PRODUCTION_STAGE};
use crate::models::RunInfo;
use crate::predictor::{ModelHandle, OnnxModel};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Configuration for the MLflow registry client
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// MLflow tracking server URI (e.g., "http://mlflow:5000")
    pub tracking_uri: String,
    /// Directory the training job logs the model under, relative to the run
    pub artifact_path: String,
    /// ONNX file name inside `artifact_path`
    pub model_file: String,
    /// Maximum accepted artifact size in bytes
    pub max_artifact_bytes: usize,
    /// Timeout applied to each registry request
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tracking_uri: "http://mlflow:5000".to_string(),
            artifact_path: "model".to_string(),
            model_file: "model.onnx".to_string(),
            max_artifact_bytes: 64 * 1024 * 1024, // 64MB
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersionInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelVersionInfo {
    version: String,
    #[serde(default)]
    run_id: Option<String>,
    /// Where the version was registered from, e.g. `runs:/<run_id>/model`
    #[serde(default)]
    source: Option<String>,
}

/// Run and artifact directory a model version was registered from
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArtifactLocation {
    run_id: String,
    artifact_path: String,
}

/// Split a `runs:/<run_id>/<path>` source URI
fn parse_runs_uri(source: &str) -> Option<ArtifactLocation> {
    let rest = source.strip_prefix("runs:/")?.trim_start_matches('/');
    let (run_id, path) = rest.split_once('/')?;
    let path = path.trim_matches('/');
    if run_id.is_empty() || path.is_empty() {
        return None;
    }
    Some(ArtifactLocation {
        run_id: run_id.to_string(),
        artifact_path: path.to_string(),
    })
}

#[derive(Debug, Serialize)]
struct SearchRunsRequest<'a> {
    experiment_ids: [&'a str; 1],
    order_by: [&'static str; 1],
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchRunsResponse {
    #[serde(default)]
    runs: Vec<RunRecord>,
}

#[derive(Debug, Deserialize)]
struct RunRecord {
    info: RunRecordInfo,
}

#[derive(Debug, Deserialize)]
struct RunRecordInfo {
    #[serde(alias = "run_uuid")]
    run_id: String,
    /// int64 fields arrive as numbers or strings depending on server version
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    status: Option<String>,
}

impl From<RunRecordInfo> for RunInfo {
    fn from(info: RunRecordInfo) -> Self {
        let start_time = match info.start_time {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        };
        RunInfo {
            run_id: info.run_id,
            start_time,
            status: info.status,
        }
    }
}

/// Model registry backed by an MLflow tracking server
pub struct MlflowRegistry {
    client: Client,
    base_url: Url,
    config: RegistryConfig,
}

impl MlflowRegistry {
    /// Create a new registry client
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        // Trailing slash so relative joins extend the path instead of replacing it
        let mut base = config.tracking_uri.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        Ok(self.base_url.join(path)?)
    }

    async fn ensure_success(response: Response) -> Result<Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Locate the artifact of the model version currently in the Production stage
    async fn production_location(
        &self,
        model_name: &str,
    ) -> Result<ArtifactLocation, RegistryError> {
        let url = self.endpoint("api/2.0/mlflow/registered-models/get-latest-versions")?;
        let response = self
            .client
            .get(url)
            .query(&[("name", model_name), ("stages", PRODUCTION_STAGE)])
            .send()
            .await?;
        let versions: LatestVersionsResponse = Self::ensure_success(response).await?.json().await?;

        let version = versions
            .model_versions
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::NotFound(format!("{model_name}/{PRODUCTION_STAGE}")))?;

        debug!(model = %model_name, version = %version.version, "Found production model version");

        if let Some(location) = version.source.as_deref().and_then(parse_runs_uri) {
            return Ok(location);
        }

        match version.run_id.filter(|id| !id.is_empty()) {
            Some(run_id) => Ok(ArtifactLocation {
                run_id,
                artifact_path: self.config.artifact_path.clone(),
            }),
            None => Err(RegistryError::NotFound(format!(
                "run for {model_name} version {}",
                version.version
            ))),
        }
    }

    /// Download the ONNX artifact logged by a run
    async fn download_artifact(
        &self,
        run_id: &str,
        artifact_path: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let url = self.endpoint("get-artifact")?;
        let artifact = format!("{}/{}", artifact_path, self.config.model_file);
        let response = self
            .client
            .get(url)
            .query(&[("path", artifact.as_str()), ("run_uuid", run_id)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let max = self.config.max_artifact_bytes;
        if let Some(size) = response.content_length() {
            if size as usize > max {
                return Err(RegistryError::ArtifactTooLarge {
                    size: size as usize,
                    max,
                });
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > max {
            return Err(RegistryError::ArtifactTooLarge {
                size: bytes.len(),
                max,
            });
        }

        info!(run_id = %run_id, artifact = %artifact, size = bytes.len(), "Downloaded model artifact");
        Ok(bytes.to_vec())
    }

    async fn load_artifact(
        &self,
        run_id: &str,
        artifact_path: &str,
    ) -> Result<Arc<dyn ModelHandle>, RegistryError> {
        let bytes = self.download_artifact(run_id, artifact_path).await?;
        let model = OnnxModel::from_bytes(&bytes)?;
        Ok(Arc::new(model))
    }
}

#[async_trait]
impl ModelRegistry for MlflowRegistry {
    async fn load_production_model(
        &self,
        model_name: &str,
    ) -> Result<Arc<dyn ModelHandle>, RegistryError> {
        let location = self.production_location(model_name).await?;
        self.load_artifact(&location.run_id, &location.artifact_path).await
    }

    async fn search_runs(
        &self,
        experiment_id: &str,
        max_results: usize,
    ) -> Result<Vec<RunInfo>, RegistryError> {
        let url = self.endpoint("api/2.0/mlflow/runs/search")?;
        let request = SearchRunsRequest {
            experiment_ids: [experiment_id],
            order_by: ["attributes.start_time DESC"],
            max_results,
        };
        let response = self.client.post(url).json(&request).send().await?;
        let found: SearchRunsResponse = Self::ensure_success(response).await?.json().await?;

        Ok(found.runs.into_iter().map(|run| run.info.into()).collect())
    }

    async fn load_run_model(&self, run_id: &str) -> Result<Arc<dyn ModelHandle>, RegistryError> {
        self.load_artifact(run_id, &self.config.artifact_path).await
    }
}
