//! Tagged payload codec for container leaf entries.
//!
//! Every entry starts with a one byte tag selecting the decoder: numeric
//! arrays keep their native representation, everything else travels as an
//! opaque JSON payload.

use rig_core::errors::{ErrorInfo, RigError};
use rig_core::Value;

/// Tag byte marking a native numeric array payload.
pub const TAG_ARRAY: u8 = b'A';
/// Tag byte marking an opaque JSON payload.
pub const TAG_OPAQUE: u8 = b'O';

/// Encodes a leaf value into its tagged wire form.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, RigError> {
    match value {
        Value::Array(values) => {
            let body = bincode::serialize(values).map_err(|err| {
                RigError::Serde(
                    ErrorInfo::new("store.encode_array", "failed to encode numeric array")
                        .with_hint(err.to_string()),
                )
            })?;
            let mut payload = Vec::with_capacity(body.len() + 1);
            payload.push(TAG_ARRAY);
            payload.extend_from_slice(&body);
            Ok(payload)
        }
        Value::Json(json) => {
            // serde_json maps are key-sorted by default, so the byte form
            // is canonical for identical payloads.
            let body = serde_json::to_vec(json).map_err(|err| {
                RigError::Serde(
                    ErrorInfo::new("store.encode_opaque", "failed to encode opaque payload")
                        .with_hint(err.to_string()),
                )
            })?;
            let mut payload = Vec::with_capacity(body.len() + 1);
            payload.push(TAG_OPAQUE);
            payload.extend_from_slice(&body);
            Ok(payload)
        }
    }
}

/// Decodes a tagged wire payload back into a leaf value.
pub fn decode_value(payload: &[u8]) -> Result<Value, RigError> {
    let (tag, body) = payload.split_first().ok_or_else(|| {
        RigError::Serde(ErrorInfo::new("store.decode_empty", "empty leaf payload"))
    })?;
    match *tag {
        TAG_ARRAY => {
            let values: Vec<f64> = bincode::deserialize(body).map_err(|err| {
                RigError::Serde(
                    ErrorInfo::new("store.decode_array", "failed to decode numeric array")
                        .with_hint(err.to_string()),
                )
            })?;
            Ok(Value::Array(values))
        }
        TAG_OPAQUE => {
            let json: serde_json::Value = serde_json::from_slice(body).map_err(|err| {
                RigError::Serde(
                    ErrorInfo::new("store.decode_opaque", "failed to decode opaque payload")
                        .with_hint(err.to_string()),
                )
            })?;
            Ok(Value::Json(json))
        }
        other => Err(RigError::Serde(
            ErrorInfo::new("store.decode_tag", "unknown leaf payload tag")
                .with_context("tag", other.to_string()),
        )),
    }
}
