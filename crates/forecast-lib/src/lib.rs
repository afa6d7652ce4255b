//! Library for the energy forecasting service
//!
//! This crate provides the core functionality for:
//! - Model resolution with a production / latest-run / dummy fallback
//! - MLflow registry access and ONNX inference
//! - Prediction request validation and response shaping
//! - Health reporting and observability

pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;
pub mod resolver;
pub mod service;

pub use health::{HealthResponse, ModelState, ServiceStatus};
pub use models::*;
pub use observability::{ServingMetrics, StructuredLogger};
pub use resolver::{ModelResolver, ResolutionOutcome, ResolvedModel, ResolverConfig};
pub use service::{PredictError, PredictionService};
