/// Shared Test Helpers for Cross-Crate Use
///
/// This module provides centralized test utilities that can be used across
/// both the `scoring` and `churn` crates to avoid code duplication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Global counter for unique test identifiers across parallel tests
static GLOBAL_TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate globally unique test identifiers that won't conflict across parallel tests
///
/// # Arguments
/// * `prefix` - A string prefix to identify the test type (e.g., "model", "scaler")
///
/// # Returns
/// A unique string in the format: "{prefix}-{timestamp}-{counter}"
pub fn generate_unique_id(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let counter = GLOBAL_TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, timestamp, counter)
}

/// Writes `contents` to a fresh file under the system temp dir and returns its path.
pub fn write_temp_file(prefix: &str, contents: &str) -> TestResult<std::path::PathBuf> {
    let path = std::env::temp_dir().join(format!("{}.json", generate_unique_id(prefix)));
    std::fs::write(&path, contents).map_err(|e| TestError::generic(format!("write {:?}: {}", path, e)))?;
    Ok(path)
}

// =============================================================================
// UNIFIED TEST ERROR HANDLING
// =============================================================================

/// Unified error type for all test failures
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Mock failure: {message}")]
    MockFailure { message: String },

    #[error("Assertion failed: {message}")]
    AssertionFailure { message: String },

    #[error("Serialization error: {source}")]
    SerializationError { #[from] source: serde_json::Error },

    #[error("HTTP error: {source}")]
    HttpError { #[from] source: http::Error },

    #[error("Generic test error: {message}")]
    Generic { message: String },
}

impl TestError {
    pub fn mock_failure(message: impl Into<String>) -> Self {
        Self::MockFailure { message: message.into() }
    }

    pub fn assertion_failure(message: impl Into<String>) -> Self {
        Self::AssertionFailure { message: message.into() }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic { message: message.into() }
    }
}

/// Alias for the standard test result type
pub type TestResult<T = ()> = Result<T, TestError>;

/// Helper macro for test assertions that return TestError instead of panicking
#[macro_export]
macro_rules! test_assert {
    ($condition:expr) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!("assertion failed: {}", stringify!($condition))
            ));
        }
    };
    ($condition:expr, $message:expr $(, $arg:expr)*) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!($message $(, $arg)*)
            ));
        }
    };
}

/// Helper macro for test assertions with equality
#[macro_export]
macro_rules! test_assert_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!("assertion failed: `(left == right)`\n  left: `{:?}`,\n right: `{:?}`",
                                left_val, right_val)
                    ));
                }
            }
        }
    };
    ($left:expr, $right:expr, $message:expr $(, $arg:expr)*) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!($message $(, $arg)*)
                    ));
                }
            }
        }
    };
}

/// Utility functions for common test operations
pub mod test_utils {
    use super::*;

    /// Request builder that returns TestError instead of panicking
    pub fn build_request(method: &str, uri: &str, body: Option<String>) -> TestResult<http::Request<String>> {
        let mut builder = http::Request::builder()
            .uri(uri)
            .method(method);

        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }

        let request = builder
            .body(body.unwrap_or_default())
            .map_err(TestError::from)?;

        Ok(request)
    }

    /// JSON request builder for a serializable payload
    pub fn json_request<T: serde::Serialize>(method: &str, uri: &str, payload: &T) -> TestResult<http::Request<String>> {
        build_request(method, uri, Some(serde_json::to_string(payload)?))
    }

    pub fn parse_json(body: &str) -> TestResult<serde_json::Value> {
        serde_json::from_str(body).map_err(TestError::from)
    }

    pub fn check_status_code(actual: http::StatusCode, expected: http::StatusCode) -> TestResult<()> {
        if actual != expected {
            return Err(TestError::assertion_failure(
                format!("Status code mismatch: expected {}, got {}", expected, actual)
            ));
        }
        Ok(())
    }

    pub fn check_error_contains(error: &dyn std::error::Error, expected_substring: &str) -> TestResult<()> {
        let error_msg = error.to_string();
        if !error_msg.contains(expected_substring) {
            return Err(TestError::assertion_failure(
                format!("Error message '{}' does not contain '{}'", error_msg, expected_substring)
            ));
        }
        Ok(())
    }
}
