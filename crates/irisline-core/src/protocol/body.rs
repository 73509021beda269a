//! JSON body decoding for strings embedded in the protocol.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PushError, Result};

/// Decode a JSON body into a structured value.
/// Scalars are rejected; every protocol body is an object or an array.
pub fn api_body_decode(bytes: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| PushError::InvalidPayload(format!("json decode failed: {e}")))?;
    if !(value.is_object() || value.is_array()) {
        return Err(PushError::InvalidPayload("json body is not an object or array".into()));
    }
    Ok(value)
}

/// Decode a JSON body straight into a typed record.
pub fn decode_as<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PushError::InvalidPayload(format!("json decode failed: {e}")))
}
