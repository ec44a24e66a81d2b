use common::test_helpers::{write_temp_file, TestError, TestResult};
use common::{test_assert, test_assert_eq};
use scoring::{
    error::{ModelLoadError, ScoringError},
    model::FeatureVector,
    scorers::{ModelAdapter, ModelLoadOptions, ModelStatus},
};
use serde_json::json;
use std::time::Duration;

use super::super::mocks::{enriched_schema, spawn_artifact_server};

fn logistic_artifact(coefficients: &[f64], intercept: f64) -> String {
    json!({
        "type": "logistic_regression",
        "feature_names": ["recency", "frequency", "tenure", "aov", "total_spent"],
        "coefficients": coefficients,
        "intercept": intercept
    })
    .to_string()
}

fn unit_scaler(mean: &[f64]) -> String {
    json!({"type": "standard", "mean": mean, "scale": [1.0, 1.0, 1.0, 1.0, 1.0]}).to_string()
}

fn options(source: impl Into<String>, scaler: Option<String>) -> ModelLoadOptions {
    ModelLoadOptions {
        source: source.into(),
        scaler,
        download_timeout: Duration::from_secs(5),
    }
}

fn path_string(path: std::path::PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_load_logistic_model_with_scaler_from_files() -> TestResult {
    // Arrange: after centring, only recency contributes and it is zero
    let model = write_temp_file("model", &logistic_artifact(&[1.0, 0.0, 0.0, 0.0, 0.0], 0.0))?;
    let scaler = write_temp_file("scaler", &unit_scaler(&[10.0, 0.0, 0.0, 0.0, 0.0]))?;

    // Act
    let adapter = ModelAdapter::try_load(
        &options(path_string(model), Some(path_string(scaler))),
        &enriched_schema(),
    )
    .await
    .map_err(|e| TestError::generic(e.to_string()))?;

    // Assert
    test_assert!(adapter.is_loaded());
    test_assert_eq!(
        adapter.status(),
        ModelStatus::Loaded {
            kind: "logistic_regression",
            scaled: true
        }
    );
    let probability = adapter
        .predict_probability(&FeatureVector::new(vec![10.0, 5.0, 200.0, 45.0, 900.0]))
        .map_err(|e| TestError::generic(e.to_string()))?;
    test_assert_eq!(probability, 0.5);
    Ok(())
}

#[tokio::test]
async fn test_identical_vectors_score_identically() -> TestResult {
    let model = write_temp_file("model", &logistic_artifact(&[0.3, -0.2, 0.01, 0.05, -0.001], -0.4))?;
    let adapter = ModelAdapter::try_load(&options(path_string(model), None), &enriched_schema())
        .await
        .map_err(|e| TestError::generic(e.to_string()))?;

    let vector = FeatureVector::new(vec![12.0, 3.0, 180.0, 52.5, 640.0]);
    let first = adapter.predict_probability(&vector).map_err(|e| TestError::generic(e.to_string()))?;
    let second = adapter.predict_probability(&vector).map_err(|e| TestError::generic(e.to_string()))?;

    test_assert_eq!(first.to_bits(), second.to_bits());
    test_assert!((0.0..=1.0).contains(&first));
    Ok(())
}

#[tokio::test]
async fn test_missing_model_file_degrades_instead_of_failing() -> TestResult {
    let missing = std::env::temp_dir().join(common::test_helpers::generate_unique_id("absent"));

    let adapter = ModelAdapter::load(&options(path_string(missing), None), &enriched_schema()).await;

    test_assert!(!adapter.is_loaded());
    match adapter.predict_probability(&FeatureVector::new(vec![0.0; 5])) {
        Err(ScoringError::ModelUnavailable { reason }) => test_assert!(reason.contains("failed to read")),
        other => return Err(TestError::assertion_failure(format!("expected unavailable, got {:?}", other))),
    }
    Ok(())
}

#[tokio::test]
async fn test_coefficient_count_must_match_schema() -> TestResult {
    let artifact = json!({
        "type": "logistic_regression",
        "coefficients": [0.1, 0.2, 0.3, 0.4],
        "intercept": 0.0
    });
    let model = write_temp_file("model", &artifact.to_string())?;

    let result = ModelAdapter::try_load(&options(path_string(model), None), &enriched_schema()).await;

    test_assert!(
        matches!(result, Err(ModelLoadError::ArityMismatch { expected: 5, actual: 4, .. })),
        "expected arity mismatch"
    );
    Ok(())
}

#[tokio::test]
async fn test_feature_names_must_match_schema_order() -> TestResult {
    let artifact = json!({
        "type": "logistic_regression",
        "feature_names": ["frequency", "recency", "tenure", "aov", "total_spent"],
        "coefficients": [0.1, 0.2, 0.3, 0.4, 0.5],
        "intercept": 0.0
    });
    let model = write_temp_file("model", &artifact.to_string())?;

    let result = ModelAdapter::try_load(&options(path_string(model), None), &enriched_schema()).await;

    test_assert!(matches!(result, Err(ModelLoadError::FeatureNameMismatch { .. })));
    Ok(())
}

#[tokio::test]
async fn test_scaler_arity_must_match_schema() -> TestResult {
    let model = write_temp_file("model", &logistic_artifact(&[0.0; 5], 0.0))?;
    let scaler = write_temp_file("scaler", &json!({"type": "min_max", "min": [0.0], "scale": [1.0]}).to_string())?;

    let result = ModelAdapter::try_load(
        &options(path_string(model), Some(path_string(scaler))),
        &enriched_schema(),
    )
    .await;

    test_assert!(matches!(
        result,
        Err(ModelLoadError::ArityMismatch { component: "scaler", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_unknown_model_type_is_parse_error() -> TestResult {
    let model = write_temp_file("model", &json!({"type": "svm", "support_vectors": []}).to_string())?;

    let result = ModelAdapter::try_load(&options(path_string(model), None), &enriched_schema()).await;

    test_assert!(matches!(result, Err(ModelLoadError::Parse { component: "model", .. })));
    Ok(())
}

#[tokio::test]
async fn test_load_model_and_scaler_over_http() -> TestResult {
    // Arrange
    let addr = spawn_artifact_server(vec![
        ("/model.json", logistic_artifact(&[1.0, 0.0, 0.0, 0.0, 0.0], 0.0)),
        ("/scaler.json", unit_scaler(&[10.0, 0.0, 0.0, 0.0, 0.0])),
    ])
    .await;

    // Act
    let adapter = ModelAdapter::try_load(
        &options(
            format!("http://{}/model.json", addr),
            Some(format!("http://{}/scaler.json", addr)),
        ),
        &enriched_schema(),
    )
    .await
    .map_err(|e| TestError::generic(e.to_string()))?;

    // Assert
    let probability = adapter
        .predict_probability(&FeatureVector::new(vec![10.0, 1.0, 1.0, 1.0, 1.0]))
        .map_err(|e| TestError::generic(e.to_string()))?;
    test_assert_eq!(probability, 0.5);
    Ok(())
}

#[tokio::test]
async fn test_download_error_status_is_reported() -> TestResult {
    let addr = spawn_artifact_server(vec![]).await;

    let result = ModelAdapter::try_load(
        &options(format!("http://{}/missing.json", addr), None),
        &enriched_schema(),
    )
    .await;

    test_assert!(matches!(result, Err(ModelLoadError::DownloadStatus { status: 404, .. })));
    Ok(())
}
