use serde::{Deserialize, Serialize};

use crate::{error::ModelLoadError, model::FeatureVector};

/// Pre-fitted feature transform applied before the model sees a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// `(x - mean) / scale`; a zero scale leaves the centred value as is.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl FeatureScaler {
    pub fn transform(&self, vector: &FeatureVector) -> Vec<f64> {
        match self {
            Self::Standard { mean, scale } => vector
                .values()
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
                .collect(),
            Self::MinMax { min, scale } => vector
                .values()
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (lo, s))| x * s + lo)
                .collect(),
        }
    }

    pub fn validate(&self, arity: usize) -> Result<(), ModelLoadError> {
        let (offsets, scale) = match self {
            Self::Standard { mean, scale } => (mean, scale),
            Self::MinMax { min, scale } => (min, scale),
        };
        for len in [offsets.len(), scale.len()] {
            if len != arity {
                return Err(ModelLoadError::ArityMismatch {
                    component: "scaler",
                    expected: arity,
                    actual: len,
                });
            }
        }
        if offsets.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err(ModelLoadError::InvalidParameter {
                component: "scaler",
                reason: "scaler parameters must be finite".to_string(),
            });
        }
        Ok(())
    }
}
