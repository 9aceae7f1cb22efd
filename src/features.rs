//! Feature Vector - Classifier input
//!
//! The four Iris measurements, looked up by name in a JSON object.
//! `FEATURES` fixes both the lookup order (first problem wins) and the
//! column order fed to the model.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Number of input features
pub const FEATURE_COUNT: usize = 4;

/// Feature names in model column order
pub const FEATURES: [&str; FEATURE_COUNT] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

/// Validated classifier input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Validate a JSON object. Unknown keys are ignored.
    pub fn from_object(item: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(FEATURES) {
            let raw = item.get(name).ok_or(ValidationError::MissingFeature(name))?;
            *slot = parse_number(raw).ok_or(ValidationError::InvalidValue(name))?;
        }
        Ok(Self { values })
    }

    /// Validate any JSON value; anything but an object is a shape error.
    pub fn from_json(item: &Value) -> Result<Self, ValidationError> {
        match item {
            Value::Object(map) => Self::from_object(map),
            _ => Err(ValidationError::BadShape),
        }
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

/// Numbers and numeric strings are accepted; the result must be finite.
fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
