use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use strum_macros::Display as EnumDisplay;

use crate::error::ScoringError;

pub type GenericError = Box<dyn Error + Send + Sync>;

/// Ordered feature values in the order the model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Rounds a probability to two decimals for display.
///
/// Rounds the exact binary value, ties to even, so `0.615` (stored just below
/// the midpoint) becomes `0.61` and `0.125` becomes `0.12`.
pub fn round_score(probability: f64) -> f64 {
    format!("{:.2}", probability).parse().unwrap_or(probability)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPrediction {
    pub probability: f64,
    pub label: String,
}

impl ScoredPrediction {
    pub fn risk_score(&self) -> f64 {
        round_score(self.probability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_score: f64,
    pub risk_level: String,
}

impl From<&ScoredPrediction> for PredictionResponse {
    fn from(prediction: &ScoredPrediction) -> Self {
        Self {
            risk_score: prediction.risk_score(),
            risk_level: prediction.label.clone(),
        }
    }
}

/// Accepts `"42"` as well as `42`; the store keys customers by their textual id.
pub fn deserialize_customer_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Unsigned(u64),
    }

    let id = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s.trim().to_string(),
        RawId::Int(i) => i.to_string(),
        RawId::Unsigned(u) => u.to_string(),
    };
    if id.is_empty() {
        return Err(D::Error::custom("customer_id must not be empty"));
    }
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(deserialize_with = "deserialize_customer_id")]
    pub customer_id: String,
    pub risk_score: f64,
    pub risk_level: String,
    #[serde(default, alias = "gpt_insight", skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

impl UpdateRecord {
    pub fn from_prediction(customer_id: String, prediction: &ScoredPrediction, insight: Option<String>) -> Self {
        Self {
            customer_id,
            risk_score: prediction.risk_score(),
            risk_level: prediction.label.clone(),
            insight,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if !self.risk_score.is_finite() || !(0.0..=1.0).contains(&self.risk_score) {
            return Err(ScoringError::validation(
                "risk_score",
                format!("expected a probability in [0, 1], got {}", self.risk_score),
            ));
        }
        if self.risk_level.trim().is_empty() {
            return Err(ScoringError::validation("risk_level", "must not be empty"));
        }
        Ok(())
    }
}

/// Body of the PATCH sent to the record store; the id travels in the query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorePatch<'a> {
    pub risk_score: f64,
    pub risk_level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpt_insight: Option<&'a str>,
}

impl<'a> From<&'a UpdateRecord> for StorePatch<'a> {
    fn from(record: &'a UpdateRecord) -> Self {
        Self {
            risk_score: record.risk_score,
            risk_level: &record.risk_level,
            gpt_insight: record.insight.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Store answered with a 2xx status
    Delivered,
    /// Store answered with a non-success status
    Rejected,
    /// Transport failure or timeout
    Failed,
    /// No store configured
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub status: String,
    pub customer_id: String,
    pub risk_score: f64,
    pub risk_level: String,
    pub delivery: DeliveryOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub const QUEUED_STATUS: &str = "queued";

impl UpdateResponse {
    pub fn queued(record: &UpdateRecord, delivery: DeliveryOutcome) -> Self {
        Self {
            status: QUEUED_STATUS.to_string(),
            customer_id: record.customer_id.clone(),
            risk_score: record.risk_score,
            risk_level: record.risk_level.clone(),
            delivery,
            supabase_status: None,
            supabase_response: None,
            warning: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAndNotifyResponse {
    pub risk_score: f64,
    pub risk_level: String,
    pub notification: UpdateResponse,
}
