use serde_json::Value;

use crate::{
    classifier::RiskClassifier,
    error::ScoringError,
    features::FeatureSchema,
    model::ScoredPrediction,
    scorers::{ModelAdapter, ModelStatus},
};

/// Feature extraction, inference and labelling for one request.
pub struct Predictor {
    schema: FeatureSchema,
    adapter: ModelAdapter,
    classifier: RiskClassifier,
}

impl Predictor {
    pub fn new(schema: FeatureSchema, adapter: ModelAdapter, classifier: RiskClassifier) -> Self {
        tracing::info!(
            schema = schema.name(),
            fields = ?schema.fields(),
            labels = ?classifier.labels(),
            "Initializing new Predictor"
        );
        Self {
            schema,
            adapter,
            classifier,
        }
    }

    pub fn predict(&self, body: &Value) -> Result<ScoredPrediction, ScoringError> {
        let vector = self.schema.build(body)?;
        let probability = self.adapter.predict_probability(&vector)?;
        let label = self.classifier.classify(probability).to_string();

        tracing::debug!(probability, label = %label, "Scored feature vector");
        Ok(ScoredPrediction { probability, label })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn model_status(&self) -> ModelStatus {
        self.adapter.status()
    }

    pub fn is_ready(&self) -> bool {
        self.adapter.is_loaded()
    }
}
