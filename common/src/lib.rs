pub mod config;
pub mod yaml_include;

/// Common utilities shared across the churn scoring workspace
///
/// This crate provides functionality used by both the scoring library and
/// the deployable service:
///
/// - Configuration types and environment overrides
/// - YAML include merging for layered config files
/// - Shared test error types and assertion helpers

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{generate_unique_id, TestError, TestResult};
