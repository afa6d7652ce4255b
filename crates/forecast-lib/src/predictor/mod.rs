//! Forecast model handles
//!
//! A [`ModelHandle`] turns a batch of input sequences into a batch of
//! forecasts. The ONNX-backed implementation is used when the registry
//! provides a model; [`DummyForecaster`] covers the case where none could be
//! resolved.

mod dummy;
mod inference;

pub use dummy::{DummyForecaster, DUMMY_OUTPUT_STEPS};
pub use inference::OnnxModel;

use thiserror::Error;
use tract_onnx::prelude::tract_ndarray::Array2;

/// Row-major batch of sequences: one row per sequence
pub type Matrix = Array2<f32>;

/// Errors raised while loading or running a model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("invalid model input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model returned {actual} rows for {expected} input sequences")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl ModelError {
    /// Category name reported to API callers as `error_type`
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::Load(_) => "LoadError",
            ModelError::InvalidInput(_) => "InvalidInput",
            ModelError::Inference(_) => "InferenceError",
            ModelError::ShapeMismatch { .. } => "ShapeMismatch",
        }
    }
}

/// A loaded forecasting model
///
/// Implementations are shared across request handlers and invoked
/// concurrently, so `predict` must not rely on per-call mutable state.
pub trait ModelHandle: Send + Sync {
    /// Forecast `output_steps` values for each row of `input`
    fn predict(&self, input: &Matrix) -> Result<Matrix, ModelError>;
}

/// Convert a matrix into nested rows for JSON serialization
pub fn to_rows(matrix: &Matrix) -> Vec<Vec<f32>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}
