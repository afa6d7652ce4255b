//! Dummy forecasts used when no model could be resolved

use super::Matrix;
use rand::Rng;
use rand_distr::StandardNormal;

/// Forecast horizon of the dummy generator
pub const DUMMY_OUTPUT_STEPS: usize = 24;

/// Produces standard-normal noise shaped like a real forecast
#[derive(Debug, Clone)]
pub struct DummyForecaster {
    output_steps: usize,
}

impl Default for DummyForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyForecaster {
    pub fn new() -> Self {
        Self {
            output_steps: DUMMY_OUTPUT_STEPS,
        }
    }

    /// Generate `rows` forecasts. Never fails; zero rows yields an empty matrix.
    pub fn generate(&self, rows: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        Matrix::from_shape_simple_fn((rows, self.output_steps), || {
            rng.sample::<f32, _>(StandardNormal)
        })
    }
}
