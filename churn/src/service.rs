use common::config::Config;
use scoring::{
    executable_utils::AppState,
    notifier::{Notifier, StoreConfigError},
    predictor::Predictor,
    scorers::{ModelAdapter, ModelLoadOptions},
};

use crate::schemas::{classifier_from_config, feature_schema, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreConfigError),
}

/// Builds the shared application state from configuration.
///
/// A model that fails to load does not fail setup; the state is returned
/// with the adapter marked unavailable. Schema, threshold and store
/// misconfiguration are errors.
pub async fn build_state(config: &Config) -> Result<AppState, SetupError> {
    let schema = feature_schema(&config.model.feature_schema)?;
    let classifier = classifier_from_config(&config.classifier)?;
    let notifier = Notifier::from_config(&config.notifier)?;

    let adapter = ModelAdapter::load(&ModelLoadOptions::from_config(&config.model), &schema).await;
    let predictor = Predictor::new(schema, adapter, classifier);

    Ok(AppState::new(predictor, notifier))
}
