//! Integration tests for the forecasting API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use forecast_lib::{
    predictor::{Matrix, ModelError, ModelHandle},
    PredictionService, ResolutionOutcome, ResolvedModel, ServingMetrics, StructuredLogger,
};
use forecast_server::api::{create_metrics_router, create_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

/// Model that forecasts the last observed value for 24 steps
struct PersistenceModel;

impl ModelHandle for PersistenceModel {
    fn predict(&self, input: &Matrix) -> Result<Matrix, ModelError> {
        let mut out = Matrix::zeros((input.nrows(), 24));
        for (i, row) in input.rows().into_iter().enumerate() {
            let last = row.iter().last().copied().unwrap_or(0.0);
            out.row_mut(i).fill(last);
        }
        Ok(out)
    }
}

struct BrokenModel;

impl ModelHandle for BrokenModel {
    fn predict(&self, _input: &Matrix) -> Result<Matrix, ModelError> {
        Err(ModelError::InvalidInput("expected 48 steps".to_string()))
    }
}

struct PanickingModel;

impl ModelHandle for PanickingModel {
    fn predict(&self, _input: &Matrix) -> Result<Matrix, ModelError> {
        panic!("tensor backend crashed")
    }
}

fn setup_test_app(outcome: ResolutionOutcome) -> Router {
    let metrics = ServingMetrics::new();
    let service = PredictionService::new(
        Arc::new(ResolvedModel::new(outcome)),
        metrics.clone(),
        StructuredLogger::new("test"),
    );
    let state = Arc::new(AppState::new(service, metrics, "http://mlflow:5000"));
    create_router(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_predict(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_in_dummy_mode() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, health) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model"], "dummy");
    assert_eq!(health["model_version"], "dummy");
    assert!(health["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_health_with_loaded_model() {
    let app = setup_test_app(ResolutionOutcome::Production(Arc::new(PersistenceModel)));

    let (status, health) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model"], "loaded");
    assert_eq!(health["model_version"], "production");
}

#[tokio::test]
async fn test_info_reports_resolution() {
    let app = setup_test_app(ResolutionOutcome::LatestRun {
        handle: Arc::new(PersistenceModel),
        run_id: "9f8e7d6c5b4a39281706".to_string(),
    });

    let (status, info) = get_json(app, "/info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["model_version"], "9f8e7d6c");
    assert_eq!(info["model_loaded"], true);
    assert_eq!(info["tracking_uri"], "http://mlflow:5000");
    assert_eq!(
        info["endpoints"],
        serde_json::json!(["/health", "/predict", "/metrics", "/info"])
    );
}

#[tokio::test]
async fn test_predict_dummy_single_sequence() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = post_predict(app, r#"{"sequences": [[0.1, 0.2, 0.3, 0.4]]}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_version"], "dummy");
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_predict_with_model() {
    let app = setup_test_app(ResolutionOutcome::Production(Arc::new(PersistenceModel)));

    let (status, body) = post_predict(app, r#"{"sequences": [[1, 2, 3], [4, 5, 6]]}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_version"], "production");
    assert_eq!(body["predictions"][0][0], 3.0);
    assert_eq!(body["predictions"][1][23], 6.0);
}

#[tokio::test]
async fn test_predict_empty_body_is_missing_data() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = post_predict(app, "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "MissingData");
    assert_eq!(body["error"], "No JSON data provided");
}

#[tokio::test]
async fn test_predict_missing_sequences_field() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = post_predict(app, r#"{"values": [[1, 2]]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "MissingField");
}

#[tokio::test]
async fn test_predict_ragged_sequences() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = post_predict(app, r#"{"sequences": [[1, 2], [3, 4, 5]]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "ValueError");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid data format:"));
}

#[tokio::test]
async fn test_predict_one_dimensional_sequences() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = post_predict(app, r#"{"sequences": [1, 2, 3]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "InvalidDimension");
}

#[tokio::test]
async fn test_predict_model_failure_is_500() {
    let app = setup_test_app(ResolutionOutcome::Production(Arc::new(BrokenModel)));

    let (status, body) = post_predict(app, r#"{"sequences": [[1, 2]]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "InvalidInput");
    assert_eq!(
        body["error"],
        "Internal server error: invalid model input: expected 48 steps"
    );
}

#[tokio::test]
async fn test_predict_panicking_model_is_500() {
    let app = setup_test_app(ResolutionOutcome::Production(Arc::new(PanickingModel)));

    let (status, body) = post_predict(app, r#"{"sequences": [[1, 2]]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "TaskFailed");
}

#[tokio::test]
async fn test_repeated_predictions_keep_model_version() {
    let app = setup_test_app(ResolutionOutcome::LatestRun {
        handle: Arc::new(PersistenceModel),
        run_id: "abcdef0123456789".to_string(),
    });

    let body = r#"{"sequences": [[1, 2, 3]]}"#;
    let (_, first) = post_predict(app.clone(), body).await;
    let (_, second) = post_predict(app, body).await;

    assert_eq!(first["model_version"], "abcdef01");
    assert_eq!(first["model_version"], second["model_version"]);
}

#[tokio::test]
async fn test_metrics_placeholder_is_no_content() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_unknown_endpoint_lists_available_endpoints() {
    let app = setup_test_app(ResolutionOutcome::Unavailable);

    let (status, body) = get_json(app, "/forecast").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["available_endpoints"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_exporter_serves_prometheus_text() {
    // Serve one prediction so the counters have samples
    let app = setup_test_app(ResolutionOutcome::Unavailable);
    let (status, _) = post_predict(app, r#"{"sequences": [[1, 2]]}"#).await;
    assert_eq!(status, StatusCode::OK);

    let response = create_metrics_router()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("forecast_api_predict_requests_total"));
    assert!(metrics_text.contains("forecast_api_predictions_total"));
    assert!(metrics_text.contains("forecast_api_predict_latency_seconds_bucket"));
}
