use common::config::ClassifierConfig;
use scoring::{
    classifier::{CutPoint, RiskClassifier},
    error::ClassifierError,
    features::FeatureSchema,
};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Feature layouts the churn models have been trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SchemaName {
    /// recency, frequency, tenure, avg_order_value
    Basic,
    /// recency, frequency, tenure, aov, total_spent
    Enriched,
    /// enriched plus subscription_status and last_product_category
    Extended,
}

impl SchemaName {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["recency", "frequency", "tenure", "avg_order_value"],
            Self::Enriched => &["recency", "frequency", "tenure", "aov", "total_spent"],
            Self::Extended => &[
                "recency",
                "frequency",
                "tenure",
                "aov",
                "total_spent",
                "subscription_status",
                "last_product_category",
            ],
        }
    }

    pub fn schema(self) -> FeatureSchema {
        FeatureSchema::new(self.to_string(), self.fields().iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SchemeName {
    ThreeTier,
    TwoTier,
    Custom,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown feature schema '{0}', expected basic, enriched or extended")]
    UnknownSchema(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("custom threshold scheme needs at least one cut-point")]
    EmptyCustomScheme,
}

pub fn feature_schema(name: &str) -> Result<FeatureSchema, SchemaError> {
    SchemaName::from_str(name.trim())
        .map(SchemaName::schema)
        .map_err(|_| SchemaError::UnknownSchema(name.to_string()))
}

pub fn classifier_from_config(config: &ClassifierConfig) -> Result<RiskClassifier, SchemaError> {
    let scheme = SchemeName::from_str(config.scheme.trim())
        .map_err(|_| ClassifierError::UnknownScheme(config.scheme.clone()))?;

    match scheme {
        SchemeName::ThreeTier => Ok(RiskClassifier::three_tier()),
        SchemeName::TwoTier => Ok(RiskClassifier::two_tier()),
        SchemeName::Custom => {
            if config.cut_points.is_empty() {
                return Err(SchemaError::EmptyCustomScheme);
            }
            let cut_points = config
                .cut_points
                .iter()
                .map(|cut| CutPoint::new(cut.above, cut.label.clone()))
                .collect();
            let floor = config.floor_label.clone().unwrap_or_else(|| "Low".to_string());
            Ok(RiskClassifier::new(cut_points, floor)?)
        }
    }
}
