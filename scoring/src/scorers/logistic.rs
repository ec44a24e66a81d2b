use serde::{Deserialize, Serialize};

use crate::{error::ModelLoadError, scorers::{sigmoid, ProbabilityModel}};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ProbabilityModel for LogisticRegression {
    fn predict_probability(&self, features: &[f64]) -> f64 {
        let margin: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(margin)
    }

    fn validate(&self, arity: usize) -> Result<(), ModelLoadError> {
        if self.coefficients.len() != arity {
            return Err(ModelLoadError::ArityMismatch {
                component: "logistic_regression",
                expected: arity,
                actual: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ModelLoadError::InvalidParameter {
                component: "logistic_regression",
                reason: "coefficients and intercept must be finite".to_string(),
            });
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}
