use common::config::ModelConfig;
use serde::Serialize;
use std::time::Duration;

use crate::{
    error::{ModelLoadError, ScoringError},
    features::FeatureSchema,
    model::FeatureVector,
    scorers::{ArtifactSource, FeatureScaler, ModelArtifact, ProbabilityModel},
};

#[derive(Debug, Clone)]
pub struct ModelLoadOptions {
    pub source: String,
    pub scaler: Option<String>,
    pub download_timeout: Duration,
}

impl ModelLoadOptions {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            source: config.source.clone(),
            scaler: config.scaler.clone().filter(|s| !s.trim().is_empty()),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelStatus {
    Loaded { kind: &'static str, scaled: bool },
    Unavailable { reason: String },
}

enum ModelState {
    Loaded {
        model: Box<dyn ProbabilityModel>,
        scaler: Option<FeatureScaler>,
    },
    Unavailable {
        reason: String,
    },
}

/// Owns the model (and scaler) for the lifetime of the process.
///
/// Built exactly once at startup, either loaded or unavailable, and never
/// mutated afterwards; handlers share it behind an `Arc`.
pub struct ModelAdapter {
    state: ModelState,
    arity: usize,
}

impl ModelAdapter {
    pub fn from_model(model: Box<dyn ProbabilityModel>, scaler: Option<FeatureScaler>, arity: usize) -> Self {
        Self {
            state: ModelState::Loaded { model, scaler },
            arity,
        }
    }

    pub fn unavailable(reason: impl Into<String>, arity: usize) -> Self {
        Self {
            state: ModelState::Unavailable { reason: reason.into() },
            arity,
        }
    }

    /// Loads model and scaler; any failure yields an unavailable adapter
    /// instead of an error so the service can start degraded.
    pub async fn load(options: &ModelLoadOptions, schema: &FeatureSchema) -> Self {
        match Self::try_load(options, schema).await {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    artifact = %options.source,
                    schema = schema.name(),
                    "Model failed to load, serving in degraded mode"
                );
                Self::unavailable(e.to_string(), schema.len())
            }
        }
    }

    pub async fn try_load(options: &ModelLoadOptions, schema: &FeatureSchema) -> Result<Self, ModelLoadError> {
        let client = reqwest::Client::builder()
            .timeout(options.download_timeout)
            .build()
            .map_err(|source| ModelLoadError::Download {
                url: options.source.clone(),
                source,
            })?;

        let source = ArtifactSource::parse(&options.source)?;
        let bytes = source.fetch(&client).await?;
        let artifact = ModelArtifact::from_json(&bytes)?;
        artifact.check_against(schema.fields())?;

        let scaler = match &options.scaler {
            Some(scaler_source) => {
                let bytes = ArtifactSource::parse(scaler_source)?.fetch(&client).await?;
                let scaler: FeatureScaler = serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Parse {
                    component: "scaler",
                    source,
                })?;
                scaler.validate(schema.len())?;
                Some(scaler)
            }
            None => None,
        };

        let model = artifact.model.into_model();
        tracing::info!(
            artifact = %source,
            kind = model.kind(),
            scaled = scaler.is_some(),
            features = schema.len(),
            "Model loaded"
        );
        Ok(Self::from_model(model, scaler, schema.len()))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded { .. })
    }

    pub fn status(&self) -> ModelStatus {
        match &self.state {
            ModelState::Loaded { model, scaler } => ModelStatus::Loaded {
                kind: model.kind(),
                scaled: scaler.is_some(),
            },
            ModelState::Unavailable { reason } => ModelStatus::Unavailable { reason: reason.clone() },
        }
    }

    /// Scales the vector when a scaler is present, then asks the model for
    /// the positive-class probability, clamped to [0, 1].
    pub fn predict_probability(&self, vector: &FeatureVector) -> Result<f64, ScoringError> {
        let (model, scaler) = match &self.state {
            ModelState::Loaded { model, scaler } => (model, scaler),
            ModelState::Unavailable { reason } => {
                return Err(ScoringError::ModelUnavailable { reason: reason.clone() });
            }
        };

        if vector.len() != self.arity {
            return Err(ScoringError::Internal(format!(
                "feature vector has {} values, model expects {}",
                vector.len(),
                self.arity
            )));
        }

        let probability = match scaler {
            Some(scaler) => model.predict_probability(&scaler.transform(vector)),
            None => model.predict_probability(vector.values()),
        };

        if probability.is_nan() {
            return Err(ScoringError::Internal(format!("{} produced NaN", model.kind())));
        }
        Ok(probability.clamp(0.0, 1.0))
    }
}
