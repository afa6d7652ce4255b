//! ONNX model inference using tract
//!
//! Loads the forecasting network exported by the training job and runs it on
//! batches of input sequences. LSTM exports declare a rank-3 input
//! `(batch, steps, features)`; rank-2 exports take the batch as is.

use super::{Matrix, ModelError, ModelHandle};
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE_MS: u128 = 250;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed forecasting model
pub struct OnnxModel {
    plan: TractModel,
    input_rank: usize,
}

impl OnnxModel {
    /// Parse and optimize an ONNX model from raw artifact bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ModelError> {
        let plan = Self::load_plan(model_bytes).map_err(|e| ModelError::Load(format!("{e:#}")))?;

        let input_rank = plan
            .model()
            .input_fact(0)
            .map(|fact| fact.shape.rank())
            .map_err(|e| ModelError::Load(format!("{e:#}")))?;

        if !(2..=3).contains(&input_rank) {
            return Err(ModelError::Load(format!(
                "unsupported input rank {input_rank}, expected 2 or 3"
            )));
        }

        debug!(input_rank, "ONNX model loaded");

        Ok(Self { plan, input_rank })
    }

    fn load_plan(model_bytes: &[u8]) -> anyhow::Result<TractModel> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(plan)
    }

    /// Reshape the batch to the rank the network was exported with
    fn to_tensor(&self, input: &Matrix) -> Result<Tensor, ModelError> {
        let (rows, steps) = input.dim();
        let shape: Vec<usize> = match self.input_rank {
            2 => vec![rows, steps],
            _ => vec![rows, steps, 1],
        };
        let data: Vec<f32> = input.iter().copied().collect();
        Tensor::from_shape(&shape, &data).map_err(|e| ModelError::InvalidInput(format!("{e:#}")))
    }

    /// Flatten everything after the batch axis into one forecast row
    fn to_matrix(output: &Tensor) -> Result<Matrix, ModelError> {
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ModelError::Inference(format!("{e:#}")))?;

        let rows = view.shape().first().copied().unwrap_or(0);
        let values: Vec<f32> = view.iter().copied().collect();
        let cols = if rows == 0 { 0 } else { values.len() / rows };

        Matrix::from_shape_vec((rows, cols), values)
            .map_err(|e| ModelError::Inference(format!("unexpected output layout: {e}")))
    }
}

impl ModelHandle for OnnxModel {
    fn predict(&self, input: &Matrix) -> Result<Matrix, ModelError> {
        let start = Instant::now();
        let tensor = self.to_tensor(input)?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ModelError::Inference(format!("{e:#}")))?;
        let output = outputs
            .first()
            .ok_or_else(|| ModelError::Inference("model produced no output".to_string()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                rows = input.nrows(),
                "Inference exceeded {}ms",
                SLOW_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), rows = input.nrows(), "Inference completed");
        }

        Self::to_matrix(output)
    }
}
