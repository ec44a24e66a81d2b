use axum::http::StatusCode;
use common::test_helpers::{test_utils, TestResult};
use common::{test_assert, test_assert_eq};
use scoring::notifier::Notifier;
use serde_json::json;

use super::super::mocks::{
    create_degraded_app, create_test_app, enriched_payload, send, send_json, FixedModel, MockModel,
};

#[tokio::test]
async fn test_predict_returns_rounded_score_and_label() -> TestResult {
    // Arrange: a model that always answers 0.55
    let app = create_test_app(Box::new(FixedModel(0.55)), Notifier::disabled());

    // Act
    let (status, body) = send_json(app, "/predict", &enriched_payload()).await?;

    // Assert
    test_utils::check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(body["risk_score"], json!(0.55));
    test_assert_eq!(body["risk_level"], json!("Medium"));
    Ok(())
}

#[tokio::test]
async fn test_predict_labels_unrounded_probability() -> TestResult {
    // 0.699999 rounds to 0.7 for display but stays below the High cut-point
    let app = create_test_app(Box::new(FixedModel(0.699_999)), Notifier::disabled());
    let (status, body) = send_json(app, "/predict", &enriched_payload()).await?;

    test_utils::check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(body["risk_score"], json!(0.7));
    test_assert_eq!(body["risk_level"], json!("Medium"));

    let app = create_test_app(Box::new(FixedModel(0.700_001)), Notifier::disabled());
    let (_, body) = send_json(app, "/predict", &enriched_payload()).await?;
    test_assert_eq!(body["risk_level"], json!("High"));
    Ok(())
}

#[tokio::test]
async fn test_predict_passes_features_in_schema_order() -> TestResult {
    // Arrange: the mock checks the vector it receives
    let mut model = MockModel::new();
    model
        .expect_predict_probability()
        .withf(|features| features.to_vec() == vec![10.0, 5.0, 200.0, 45.0, 900.0])
        .times(1)
        .return_const(0.2);
    model.expect_kind().return_const("mock");
    let app = create_test_app(Box::new(model), Notifier::disabled());

    // Act: keys deliberately out of order, plus an unrelated extra key
    let payload = json!({
        "total_spent": 900.0,
        "aov": "45",
        "tenure": 200,
        "frequency": 5,
        "recency": 10,
        "email": "someone@example.com"
    });
    let (status, body) = send_json(app, "/predict", &payload).await?;

    // Assert
    test_utils::check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(body["risk_level"], json!("Low"));
    Ok(())
}

#[tokio::test]
async fn test_predict_missing_field_is_validation_error() -> TestResult {
    // Arrange: the model must never be consulted for an invalid payload
    let mut model = MockModel::new();
    model.expect_predict_probability().never();
    let app = create_test_app(Box::new(model), Notifier::disabled());

    let mut payload = enriched_payload();
    if let Some(fields) = payload.as_object_mut() {
        fields.remove("tenure");
    }

    // Act
    let (status, body) = send_json(app, "/predict", &payload).await?;

    // Assert
    test_utils::check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert_eq!(body["kind"], json!("validation"));
    test_assert_eq!(body["field"], json!("tenure"));
    test_assert!(body.get("risk_score").is_none(), "no partial result on error");
    Ok(())
}

#[tokio::test]
async fn test_predict_non_numeric_field_is_validation_error() -> TestResult {
    let app = create_test_app(Box::new(FixedModel(0.5)), Notifier::disabled());
    let mut payload = enriched_payload();
    payload["frequency"] = json!("often");

    let (status, body) = send_json(app, "/predict", &payload).await?;

    test_utils::check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert_eq!(body["field"], json!("frequency"));
    Ok(())
}

#[tokio::test]
async fn test_predict_malformed_json_is_validation_error() -> TestResult {
    let app = create_test_app(Box::new(FixedModel(0.5)), Notifier::disabled());

    let (status, body) = send(app, "POST", "/predict", Some("{\"recency\": 10,".to_string())).await?;

    test_utils::check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert_eq!(body["kind"], json!("validation"));
    test_assert_eq!(body["field"], json!("body"));
    Ok(())
}

#[tokio::test]
async fn test_predict_non_object_body_is_validation_error() -> TestResult {
    let app = create_test_app(Box::new(FixedModel(0.5)), Notifier::disabled());

    let (status, body) = send_json(app, "/predict", &json!([1, 2, 3, 4, 5])).await?;

    test_utils::check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert_eq!(body["field"], json!("body"));
    Ok(())
}

#[tokio::test]
async fn test_predict_unavailable_model_returns_503_every_time() -> TestResult {
    // Arrange
    let app = create_degraded_app("artifact missing");

    // Act / Assert: the adapter never recovers lazily
    for _ in 0..3 {
        let (status, body) = send_json(app.clone(), "/predict", &enriched_payload()).await?;
        test_utils::check_status_code(status, StatusCode::SERVICE_UNAVAILABLE)?;
        test_assert_eq!(body["kind"], json!("model_unavailable"));
        test_assert!(body["error"].as_str().unwrap_or_default().contains("artifact missing"));
    }
    Ok(())
}

#[tokio::test]
async fn test_predict_validates_before_reporting_unavailable_model() -> TestResult {
    let app = create_degraded_app("artifact missing");

    let (status, body) = send_json(app, "/predict", &json!({"recency": 1})).await?;

    test_utils::check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert_eq!(body["kind"], json!("validation"));
    Ok(())
}

#[tokio::test]
async fn test_predict_nan_from_model_is_internal_error() -> TestResult {
    let app = create_test_app(Box::new(FixedModel(f64::NAN)), Notifier::disabled());

    let (status, body) = send_json(app, "/predict", &enriched_payload()).await?;

    test_utils::check_status_code(status, StatusCode::INTERNAL_SERVER_ERROR)?;
    test_assert_eq!(body["kind"], json!("internal"));
    Ok(())
}

#[tokio::test]
async fn test_predict_is_deterministic() -> TestResult {
    let app = create_test_app(Box::new(FixedModel(0.31)), Notifier::disabled());

    let (_, first) = send_json(app.clone(), "/predict", &enriched_payload()).await?;
    let (_, second) = send_json(app, "/predict", &enriched_payload()).await?;

    test_assert_eq!(first, second);
    Ok(())
}
