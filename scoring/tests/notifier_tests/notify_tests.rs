use common::test_helpers::TestResult;
use common::{test_assert, test_assert_eq};
use scoring::{
    model::{DeliveryOutcome, UpdateRecord},
    notifier::{DeliveryError, Notifier, NOT_CONFIGURED_WARNING},
};
use std::sync::Arc;

use super::super::mocks::{store_failing, store_returning};

fn record() -> UpdateRecord {
    UpdateRecord {
        customer_id: "cus_9".to_string(),
        risk_score: 0.41,
        risk_level: "Medium".to_string(),
        insight: None,
    }
}

#[tokio::test]
async fn test_disabled_notifier_skips_with_warning() -> TestResult {
    let notifier = Notifier::disabled();

    let response = notifier.notify(&record()).await;

    test_assert!(!notifier.is_enabled());
    test_assert_eq!(response.delivery, DeliveryOutcome::Skipped);
    test_assert_eq!(response.warning.as_deref(), Some(NOT_CONFIGURED_WARNING));
    test_assert_eq!(response.risk_level, "Medium");
    Ok(())
}

#[tokio::test]
async fn test_store_is_called_exactly_once() -> TestResult {
    // Arrange: `times(1)` fails the test on a retry
    let notifier = Notifier::new(Arc::new(store_failing(DeliveryError::Request("reset".to_string()))));

    // Act
    let response = notifier.notify(&record()).await;

    // Assert
    test_assert_eq!(response.delivery, DeliveryOutcome::Failed);
    test_assert_eq!(response.error.as_deref(), Some("record store request failed: reset"));
    Ok(())
}

#[tokio::test]
async fn test_2xx_body_is_kept_as_diagnostic() -> TestResult {
    let notifier = Notifier::new(Arc::new(store_returning(200, "[{\"id\":\"cus_9\"}]")));

    let response = notifier.notify(&record()).await;

    test_assert_eq!(response.delivery, DeliveryOutcome::Delivered);
    test_assert_eq!(response.supabase_response.as_deref(), Some("[{\"id\":\"cus_9\"}]"));
    Ok(())
}

#[tokio::test]
async fn test_serialized_response_omits_empty_diagnostics() -> TestResult {
    let notifier = Notifier::new(Arc::new(store_returning(204, "")));

    let response = notifier.notify(&record()).await;
    let value = serde_json::to_value(&response)?;

    test_assert_eq!(value["status"], "queued");
    test_assert_eq!(value["delivery"], "delivered");
    test_assert!(value.get("warning").is_none());
    test_assert!(value.get("error").is_none());
    test_assert!(value.get("supabase_response").is_none());
    Ok(())
}
