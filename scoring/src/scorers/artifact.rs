use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, path::PathBuf};
use url::Url;

use crate::{
    error::ModelLoadError,
    scorers::{GradientBoostedTrees, LogisticRegression, ProbabilityModel, RandomForest},
};

/// Where a model or scaler artifact is read from at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    File(PathBuf),
    Url(Url),
}

impl ArtifactSource {
    pub fn parse(source: &str) -> Result<Self, ModelLoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(ModelLoadError::InvalidSource(source.to_string()));
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            let url = Url::parse(source).map_err(|_| ModelLoadError::InvalidSource(source.to_string()))?;
            return Ok(Self::Url(url));
        }
        Ok(Self::File(PathBuf::from(source)))
    }

    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>, ModelLoadError> {
        match self {
            Self::File(path) => tokio::fs::read(path).await.map_err(|source| ModelLoadError::Io {
                path: path.clone(),
                source,
            }),
            Self::Url(url) => {
                tracing::info!(url = %url, "Downloading artifact");
                let download_error = |source| ModelLoadError::Download {
                    url: url.to_string(),
                    source,
                };
                let response = client.get(url.clone()).send().await.map_err(download_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ModelLoadError::DownloadStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                let bytes = response.bytes().await.map_err(download_error)?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression(LogisticRegression),
    GradientBoostedTrees(GradientBoostedTrees),
    RandomForest(RandomForest),
}

impl ModelKind {
    pub fn into_model(self) -> Box<dyn ProbabilityModel> {
        match self {
            Self::LogisticRegression(m) => Box::new(m),
            Self::GradientBoostedTrees(m) => Box::new(m),
            Self::RandomForest(m) => Box::new(m),
        }
    }
}

/// A trained model as exported by the training pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub model: ModelKind,
    pub feature_names: Option<Vec<String>>,
}

impl ModelArtifact {
    /// Parses `{"type": ..., <model fields>, "feature_names"?: [...]}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let parse_error = |source| ModelLoadError::Parse {
            component: "model",
            source,
        };

        let mut value: Value = serde_json::from_slice(bytes).map_err(parse_error)?;
        let feature_names = value
            .as_object_mut()
            .and_then(|object| object.remove("feature_names"))
            .map(serde_json::from_value::<Vec<String>>)
            .transpose()
            .map_err(parse_error)?;
        let model = serde_json::from_value(value).map_err(parse_error)?;

        Ok(Self { model, feature_names })
    }

    /// Checks declared feature names and model shape against the schema fields.
    pub fn check_against(&self, fields: &[String]) -> Result<(), ModelLoadError> {
        if let Some(names) = &self.feature_names {
            if names.as_slice() != fields {
                return Err(ModelLoadError::FeatureNameMismatch {
                    expected: fields.to_vec(),
                    actual: names.clone(),
                });
            }
        }
        match &self.model {
            ModelKind::LogisticRegression(m) => m.validate(fields.len()),
            ModelKind::GradientBoostedTrees(m) => m.validate(fields.len()),
            ModelKind::RandomForest(m) => m.validate(fields.len()),
        }
    }
}
