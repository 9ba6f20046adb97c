//! Field values supplied per export call

use crate::error::{OverlayError, Result};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// A scalar value for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Text to stamp for this value, or `None` when nothing should be drawn
    ///
    /// Numbers print the way JavaScript's `String()` does: `12` rather than
    /// `12.0`, `-0` as `0`, and exponent notation below `1e-6` or from `1e21`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.is_finite() => Some(format_number(*n)),
            Self::Number(_) => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => None,
        }
    }

    /// Convert a JSON value; arrays and objects have no text form
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    n.to_string()
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Values keyed by field id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: HashMap<String, FieldValue>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one for the same id
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(id.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Text to draw for a field id, if any
    pub fn text_for(&self, id: &str) -> Option<String> {
        self.values.get(id).and_then(FieldValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from a JSON object such as submitted form state
    ///
    /// Entries whose value is an array or object are dropped.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(OverlayError::InvalidValues(
                "field values must be a JSON object".to_string(),
            ));
        };

        let mut values = Self::new();
        for (id, raw) in map {
            match FieldValue::from_json(raw) {
                Some(v) => values.insert(id, v),
                None => warn!("Skipping value for field '{}': not representable as text", id),
            }
        }
        Ok(values)
    }

    /// Parse from a JSON object string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}
