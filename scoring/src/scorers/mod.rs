pub mod adapter;
pub mod artifact;
pub mod logistic;
pub mod scaler;
pub mod trees;

pub use adapter::{ModelAdapter, ModelLoadOptions, ModelStatus};
pub use artifact::{ArtifactSource, ModelArtifact, ModelKind};
pub use logistic::LogisticRegression;
pub use scaler::FeatureScaler;
pub use trees::{GradientBoostedTrees, RandomForest, Tree, TreeNode};

use crate::error::ModelLoadError;

/// A trained binary classifier producing the positive-class probability.
pub trait ProbabilityModel: Send + Sync {
    /// Probability of the positive class for already-scaled features.
    fn predict_probability(&self, features: &[f64]) -> f64;

    /// Checks the model against the number of features it will receive.
    fn validate(&self, arity: usize) -> Result<(), ModelLoadError>;

    fn kind(&self) -> &'static str;
}

pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
