//! Prediction error taxonomy

use crate::models::ErrorResponse;
use crate::predictor::ModelError;
use thiserror::Error;

/// Why a prediction request did not produce a forecast
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No JSON data provided")]
    MissingData,

    #[error("Missing 'sequences' field in request")]
    MissingField,

    #[error("Invalid data format: {0}")]
    InvalidValue(String),

    #[error("Sequences must be a 2D array")]
    InvalidDimension { ndim: usize },

    #[error("Internal server error: {0}")]
    Model(#[from] ModelError),

    /// The blocking inference task panicked or was cancelled
    #[error("Internal server error: {0}")]
    TaskFailed(String),
}

impl PredictError {
    /// Tag reported as `error_type` in the response body
    pub fn error_type(&self) -> &'static str {
        match self {
            PredictError::MissingData => "MissingData",
            PredictError::MissingField => "MissingField",
            PredictError::InvalidValue(_) => "ValueError",
            PredictError::InvalidDimension { .. } => "InvalidDimension",
            PredictError::Model(e) => e.kind(),
            PredictError::TaskFailed(_) => "TaskFailed",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::MissingData
                | PredictError::MissingField
                | PredictError::InvalidValue(_)
                | PredictError::InvalidDimension { .. }
        )
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }
}
