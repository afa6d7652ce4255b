//! Startup model resolution
//!
//! Resolves the serving model exactly once, trying in order:
//! 1. the registered model in the Production stage,
//! 2. the artifact of the most recently started training run,
//! 3. nothing, in which case requests are served with dummy forecasts.
//!
//! Each tier yields an explicit [`TierResult`]; failures are logged and
//! demoted to the next tier, so resolution itself never fails.

use crate::models::RunInfo;
use crate::observability::StructuredLogger;
use crate::predictor::ModelHandle;
use crate::registry::ModelRegistry;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Version label of a model loaded from the Production stage
pub const PRODUCTION_VERSION: &str = "production";

/// Version label used when no model could be resolved
pub const DUMMY_VERSION: &str = "dummy";

/// Number of run id characters used as the version label
pub const RUN_ID_PREFIX_LEN: usize = 8;

/// Which model, if any, the service runs with
#[derive(Clone)]
pub enum ResolutionOutcome {
    Production(Arc<dyn ModelHandle>),
    LatestRun {
        handle: Arc<dyn ModelHandle>,
        run_id: String,
    },
    Unavailable,
}

impl ResolutionOutcome {
    pub fn handle(&self) -> Option<&Arc<dyn ModelHandle>> {
        match self {
            ResolutionOutcome::Production(handle) => Some(handle),
            ResolutionOutcome::LatestRun { handle, .. } => Some(handle),
            ResolutionOutcome::Unavailable => None,
        }
    }

    /// Short name of the tier that produced this outcome
    pub fn source(&self) -> &'static str {
        match self {
            ResolutionOutcome::Production(_) => "production",
            ResolutionOutcome::LatestRun { .. } => "latest_run",
            ResolutionOutcome::Unavailable => "dummy",
        }
    }

    fn version_label(&self) -> String {
        match self {
            ResolutionOutcome::Production(_) => PRODUCTION_VERSION.to_string(),
            ResolutionOutcome::LatestRun { run_id, .. } => {
                run_id.chars().take(RUN_ID_PREFIX_LEN).collect()
            }
            ResolutionOutcome::Unavailable => DUMMY_VERSION.to_string(),
        }
    }
}

impl fmt::Debug for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::Production(_) => f.write_str("Production"),
            ResolutionOutcome::LatestRun { run_id, .. } => {
                f.debug_struct("LatestRun").field("run_id", run_id).finish()
            }
            ResolutionOutcome::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Immutable result of startup resolution, shared by all request handlers
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    outcome: ResolutionOutcome,
    model_version: String,
}

impl ResolvedModel {
    pub fn new(outcome: ResolutionOutcome) -> Self {
        let model_version = outcome.version_label();
        Self {
            outcome,
            model_version,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(ResolutionOutcome::Unavailable)
    }

    pub fn outcome(&self) -> &ResolutionOutcome {
        &self.outcome
    }

    pub fn handle(&self) -> Option<&Arc<dyn ModelHandle>> {
        self.outcome.handle()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn is_loaded(&self) -> bool {
        self.outcome.handle().is_some()
    }
}

/// Resolution tiers, in the order they are attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Production,
    LatestRun,
}

impl Tier {
    pub const ORDER: [Tier; 2] = [Tier::Production, Tier::LatestRun];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Production => "production",
            Tier::LatestRun => "latest_run",
        }
    }
}

/// Result of attempting a single tier
#[derive(Debug)]
pub enum TierResult {
    Hit(ResolutionOutcome),
    Miss(String),
}

/// Configuration for model resolution
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Registered model name looked up in the Production stage
    pub model_name: String,
    /// Experiment searched for the latest run
    pub experiment_id: String,
    /// Runs fetched per search; ties on start time are broken locally
    pub run_search_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            model_name: "energy_forecasting_model".to_string(),
            experiment_id: "1".to_string(),
            run_search_limit: 5,
        }
    }
}

/// Pick the most recently started run, breaking ties by run id
pub fn select_latest_run(runs: Vec<RunInfo>) -> Option<RunInfo> {
    runs.into_iter()
        .max_by_key(|run| (run.start_time, Reverse(run.run_id.clone())))
}

/// Resolves the serving model through the tiered fallback
pub struct ModelResolver {
    registry: Arc<dyn ModelRegistry>,
    config: ResolverConfig,
    logger: StructuredLogger,
}

impl ModelResolver {
    pub fn new(
        registry: Arc<dyn ModelRegistry>,
        config: ResolverConfig,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            registry,
            config,
            logger,
        }
    }

    /// Run the fallback chain. Always returns a usable resolution.
    pub async fn resolve(&self) -> ResolvedModel {
        for tier in Tier::ORDER {
            match self.attempt(tier).await {
                TierResult::Hit(outcome) => {
                    let resolved = ResolvedModel::new(outcome);
                    self.logger
                        .log_tier_attempt(tier.as_str(), true, resolved.model_version());
                    self.logger
                        .log_resolution(resolved.outcome().source(), resolved.model_version());
                    return resolved;
                }
                TierResult::Miss(reason) => {
                    self.logger.log_tier_attempt(tier.as_str(), false, &reason);
                }
            }
        }

        let resolved = ResolvedModel::unavailable();
        self.logger
            .log_resolution(resolved.outcome().source(), resolved.model_version());
        resolved
    }

    async fn attempt(&self, tier: Tier) -> TierResult {
        match tier {
            Tier::Production => self.try_production().await,
            Tier::LatestRun => self.try_latest_run().await,
        }
    }

    async fn try_production(&self) -> TierResult {
        match self
            .registry
            .load_production_model(&self.config.model_name)
            .await
        {
            Ok(handle) => TierResult::Hit(ResolutionOutcome::Production(handle)),
            Err(e) => TierResult::Miss(format!(
                "could not load production model {}: {}",
                self.config.model_name, e
            )),
        }
    }

    async fn try_latest_run(&self) -> TierResult {
        let runs = match self
            .registry
            .search_runs(&self.config.experiment_id, self.config.run_search_limit)
            .await
        {
            Ok(runs) => runs,
            Err(e) => return TierResult::Miss(format!("could not search runs: {e}")),
        };

        let Some(run) = select_latest_run(runs) else {
            return TierResult::Miss(format!(
                "no runs found in experiment {}",
                self.config.experiment_id
            ));
        };

        match self.registry.load_run_model(&run.run_id).await {
            Ok(handle) => TierResult::Hit(ResolutionOutcome::LatestRun {
                handle,
                run_id: run.run_id,
            }),
            Err(e) => TierResult::Miss(format!(
                "could not load model from run {}: {}",
                run.run_id, e
            )),
        }
    }
}
