//! Prediction request pipeline
//!
//! Validates a request body, runs it through the resolved model (or the
//! dummy generator when there is none) and shapes the response.

mod error;
mod validation;

pub use error::PredictError;
pub use validation::{parse_request, to_matrix, SEQUENCES_FIELD};

use crate::models::PredictionResponse;
use crate::observability::{ServingMetrics, StructuredLogger};
use crate::predictor::{to_rows, DummyForecaster, Matrix, ModelError};
use crate::resolver::ResolvedModel;
use std::sync::Arc;
use tracing::debug;

/// Stateless prediction service bound to the startup resolution
pub struct PredictionService {
    resolved: Arc<ResolvedModel>,
    dummy: DummyForecaster,
    metrics: ServingMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(
        resolved: Arc<ResolvedModel>,
        metrics: ServingMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            resolved,
            dummy: DummyForecaster::new(),
            metrics,
            logger,
        }
    }

    pub fn resolved(&self) -> &ResolvedModel {
        &self.resolved
    }

    /// Serve one `/predict` body. Blocks while the model runs.
    pub fn predict(&self, body: &[u8]) -> Result<PredictionResponse, PredictError> {
        let sequences = parse_request(body)?;
        debug!(shape = ?sequences.dim(), "Input sequences validated");

        let (predictions, source) = self.forecast(&sequences)?;

        let rows = predictions.nrows();
        self.metrics.add_predictions(source, rows);
        self.logger
            .log_prediction(rows, source, self.resolved.model_version());

        Ok(PredictionResponse {
            predictions: to_rows(&predictions),
            model_version: self.resolved.model_version().to_string(),
        })
    }

    fn forecast(&self, sequences: &Matrix) -> Result<(Matrix, &'static str), PredictError> {
        let rows = sequences.nrows();

        match self.resolved.handle() {
            Some(handle) if rows > 0 => {
                let output = handle.predict(sequences)?;
                if output.nrows() != rows {
                    return Err(ModelError::ShapeMismatch {
                        expected: rows,
                        actual: output.nrows(),
                    }
                    .into());
                }
                Ok((output, "model"))
            }
            _ => Ok((self.dummy.generate(rows), "dummy")),
        }
    }

    /// Record a failed request in logs; the caller turns it into a response
    pub fn report_failure(&self, err: &PredictError) {
        self.logger.log_prediction_failed(
            err.error_type(),
            &err.to_string(),
            &format!("{err:?}"),
            !err.is_client_error(),
        );
    }
}
