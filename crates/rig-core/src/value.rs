//! Leaf value model for persisted state entries.

use serde::{Deserialize, Serialize};

/// A single leaf value held by the state tree.
///
/// Numeric arrays keep their native representation so they round-trip
/// through the container as arrays; everything else is carried as an opaque
/// JSON payload and decoded back on the matching path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Native numeric array.
    Array(Vec<f64>),
    /// Opaque scalar or structured payload.
    Json(serde_json::Value),
}

impl Value {
    /// Returns the numeric array, if this value is one.
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::Array(values) => Some(values),
            Value::Json(_) => None,
        }
    }

    /// Returns the opaque payload, if this value is one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Array(_) => None,
            Value::Json(value) => Some(value),
        }
    }

    /// Convenience accessor for integer payloads.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(|value| value.as_i64())
    }

    /// Convenience accessor for float payloads.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(|value| value.as_f64())
    }

    /// Convenience accessor for string payloads.
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(|value| value.as_str())
    }

    /// Convenience accessor for boolean payloads.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(|value| value.as_bool())
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Array(values)
    }
}

impl From<&[f64]> for Value {
    fn from(values: &[f64]) -> Self {
        Value::Array(values.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Json(serde_json::Value::from(value))
    }
}
