//! Prediction request schema
//!
//! The serving contract is a JSON object carrying twelve named numeric
//! fields. Validation happens in two passes: every required key must be
//! present, then each value must coerce to a finite `f64`. The resulting
//! [`FeatureVector`] is always laid out in [`REQUIRED_FEATURES`] order,
//! independent of the key order in the request.

use serde_json::{Map, Value};
use thiserror::Error;

/// Number of features the serving contract requires
pub const N_FEATURES: usize = 12;

/// Required request fields, in feature-vector order
pub const REQUIRED_FEATURES: [&str; N_FEATURES] = [
    "fixed_acidity",
    "volatile_acidity",
    "citric_acid",
    "residual_sugar",
    "chlorides",
    "free_sulfur_dioxide",
    "total_sulfur_dioxide",
    "density",
    "pH",
    "sulphates",
    "alcohol",
    "wine_type",
];

/// Categorical red/white indicator column
pub const WINE_TYPE: &str = "wine_type";

/// Target column of the training dataset
pub const TARGET: &str = "quality";

/// Reasons a request body cannot be turned into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("missing required features: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Fixed-order numeric features of one wine sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0.to_vec()
    }
}

/// Validate a decoded request body and build its feature vector.
pub fn parse_features(body: &Value) -> Result<FeatureVector, FeatureError> {
    let object = body.as_object().ok_or(FeatureError::NotAnObject)?;

    let missing = missing_features(object);
    if !missing.is_empty() {
        return Err(FeatureError::Missing(missing));
    }

    let mut values = [0.0; N_FEATURES];
    for (slot, name) in values.iter_mut().zip(REQUIRED_FEATURES) {
        // presence checked above
        let raw = object.get(name).unwrap_or(&Value::Null);
        *slot = coerce(name, raw)?;
    }

    Ok(FeatureVector(values))
}

fn missing_features(object: &Map<String, Value>) -> Vec<String> {
    REQUIRED_FEATURES
        .iter()
        .filter(|name| !object.contains_key(**name))
        .map(|name| name.to_string())
        .collect()
}

fn coerce(field: &str, raw: &Value) -> Result<f64, FeatureError> {
    let invalid = |reason: &str| FeatureError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let value = match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid("number out of range"))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("not a number"))?,
        Value::Null => return Err(invalid("null")),
        Value::Array(_) | Value::Object(_) => return Err(invalid("expected a scalar")),
    };

    if !value.is_finite() {
        return Err(invalid("not finite"));
    }
    Ok(value)
}
