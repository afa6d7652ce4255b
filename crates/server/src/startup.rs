//! Startup model resolution

use crate::config::ServiceConfig;
use forecast_lib::{registry::MlflowRegistry, ModelResolver, ResolvedModel, StructuredLogger};
use std::sync::Arc;
use tracing::warn;

/// Resolve the serving model. Never fails: a registry client that cannot be
/// built leaves the service in dummy mode.
pub async fn resolve_model(config: &ServiceConfig, logger: &StructuredLogger) -> ResolvedModel {
    let registry = match MlflowRegistry::new(config.registry()) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            warn!(
                error = %e,
                tracking_uri = %config.tracking_uri,
                "Could not create registry client, skipping model resolution"
            );
            let resolved = ResolvedModel::unavailable();
            logger.log_resolution(resolved.outcome().source(), resolved.model_version());
            return resolved;
        }
    };

    ModelResolver::new(registry, config.resolver(), logger.clone())
        .resolve()
        .await
}
