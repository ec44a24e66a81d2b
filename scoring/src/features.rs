use serde_json::Value;

use crate::{error::ScoringError, model::FeatureVector};

/// Ordered list of feature names a model was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    name: String,
    fields: Vec<String>,
}

impl FeatureSchema {
    pub fn new<S: Into<String>>(name: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extracts every schema field from a JSON object, in schema order.
    ///
    /// Numbers are taken as-is, booleans become 0/1 and numeric strings are
    /// parsed. Fields outside the schema are ignored.
    pub fn build(&self, body: &Value) -> Result<FeatureVector, ScoringError> {
        let object = body
            .as_object()
            .ok_or_else(|| ScoringError::validation("body", format!("expected a JSON object, got {}", type_name(body))))?;

        let values = self
            .fields
            .iter()
            .map(|field| match object.get(field) {
                None | Some(Value::Null) => Err(ScoringError::validation(field, "missing required field")),
                Some(value) => coerce(field, value),
            })
            .collect::<Result<Vec<f64>, ScoringError>>()?;

        Ok(FeatureVector::new(values))
    }
}

fn coerce(field: &str, value: &Value) -> Result<f64, ScoringError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ScoringError::validation(
            field,
            format!("expected a number, got {} {}", type_name(value), value),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
