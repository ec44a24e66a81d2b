use std::path::PathBuf;
use strum_macros::Display as EnumDisplay;

/// Machine-readable discriminant carried in every error response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    ModelUnavailable,
    DownstreamDelivery,
    Internal,
}

/// Failures of a single scoring request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScoringError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Failures while reading or validating a model or scaler artifact at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("invalid artifact source '{0}'")]
    InvalidSource(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("failed to parse {component} artifact: {source}")]
    Parse {
        component: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{component} expects {actual} features but the schema has {expected}")]
    ArityMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("model feature names {actual:?} do not match schema {expected:?}")]
    FeatureNameMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("invalid tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },

    #[error("invalid {component} parameter: {reason}")]
    InvalidParameter {
        component: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("cut-point {0} is not a probability in [0, 1]")]
    OutOfRange(f64),

    #[error("cut-point {0} appears more than once")]
    Duplicate(f64),

    #[error("label must not be empty")]
    EmptyLabel,

    #[error("unknown threshold scheme '{0}'")]
    UnknownScheme(String),
}
