//! Content handlers: the marshaling format spoken with the service.
//!
//! The service negotiates the body format through `Accept` and
//! `Content-Type`. JSON is the only format implemented; the connection holds
//! its handler as a trait object so another format can be plugged in.

use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::error::{RestAuthError, RestAuthResult};

/// MIME type of the JSON handler.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Converts request parameters to bytes and response bodies to values.
pub trait ContentHandler: Debug + Send + Sync {
    /// MIME type sent in `Accept` and `Content-Type`.
    fn mime_type(&self) -> &str;

    /// Encode a parameter object as a request body.
    fn serialize(&self, params: &Map<String, Value>) -> RestAuthResult<Vec<u8>>;

    /// Decode a response body.
    fn deserialize(&self, body: &str) -> RestAuthResult<Value>;
}

/// JSON content handler (`application/json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl ContentHandler for JsonHandler {
    fn mime_type(&self) -> &str {
        JSON_MIME_TYPE
    }

    fn serialize(&self, params: &Map<String, Value>) -> RestAuthResult<Vec<u8>> {
        serde_json::to_vec(params).map_err(|e| RestAuthError::Serialize(e.to_string()))
    }

    fn deserialize(&self, body: &str) -> RestAuthResult<Value> {
        serde_json::from_str(body)
            .map_err(|e| RestAuthError::Parse(format!("invalid JSON body: {e}")))
    }
}

/// Decode a string body.
pub(crate) fn decode_string(handler: &dyn ContentHandler, body: &str) -> RestAuthResult<String> {
    match handler.deserialize(body)? {
        Value::String(s) => Ok(s),
        other => Err(RestAuthError::Parse(format!(
            "expected a string, got {}",
            type_name(&other)
        ))),
    }
}

/// Decode a list of strings, e.g. user or group names.
pub(crate) fn decode_string_list(
    handler: &dyn ContentHandler,
    body: &str,
) -> RestAuthResult<Vec<String>> {
    match handler.deserialize(body)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(RestAuthError::Parse(format!(
                    "expected a list of strings, found {}",
                    type_name(&other)
                ))),
            })
            .collect(),
        other => Err(RestAuthError::Parse(format!(
            "expected a list, got {}",
            type_name(&other)
        ))),
    }
}

/// Decode an object mapping strings to strings, e.g. user properties.
pub(crate) fn decode_string_map(
    handler: &dyn ContentHandler,
    body: &str,
) -> RestAuthResult<std::collections::HashMap<String, String>> {
    match handler.deserialize(body)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                other => Err(RestAuthError::Parse(format!(
                    "expected a string value for key {k:?}, found {}",
                    type_name(&other)
                ))),
            })
            .collect(),
        other => Err(RestAuthError::Parse(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
