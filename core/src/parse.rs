//! Response decoding and normalization.
//!
//! # Design
//! `parse` decides the shape of a response exactly once and records it in
//! `NormalizedResponse`. Decoding is best effort: a body that is not valid
//! JSON or XML comes back as `Raw` text instead of failing the call.
//!
//! JSON keys are kept exactly as the server sent them, so a decoded object
//! always has the same key/value pairs as the body. XML element names are
//! undasherized by the XML decoder at every depth.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RequestFormat;
use crate::xml;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResponse {
    Object(Map<String, Value>),
    List(Vec<Value>),
    /// A decoded value that is neither a mapping nor a sequence.
    Scalar(Value),
    /// The server answered with an empty body.
    Success,
    /// The body could not be decoded and is returned untouched.
    Raw(String),
}

impl NormalizedResponse {
    pub fn is_success_marker(&self) -> bool {
        matches!(self, NormalizedResponse::Success)
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            NormalizedResponse::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            NormalizedResponse::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            NormalizedResponse::Raw(body) => Some(body),
            _ => None,
        }
    }

    /// JSON view of the response. `Success` becomes `{"success": true}` and
    /// `Raw` becomes a JSON string.
    pub fn to_value(&self) -> Value {
        match self {
            NormalizedResponse::Object(map) => Value::Object(map.clone()),
            NormalizedResponse::List(items) => Value::Array(items.clone()),
            NormalizedResponse::Scalar(value) => value.clone(),
            NormalizedResponse::Success => success_marker(),
            NormalizedResponse::Raw(body) => Value::String(body.clone()),
        }
    }
}

impl Serialize for NormalizedResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn success_marker() -> Value {
    let mut map = Map::new();
    map.insert("success".to_string(), Value::Bool(true));
    Value::Object(map)
}

/// Decode `body` per `format` and classify the result.
pub fn parse(body: &str, format: RequestFormat) -> NormalizedResponse {
    if body.is_empty() {
        return NormalizedResponse::Success;
    }

    let decoded = match format {
        RequestFormat::Json => serde_json::from_str::<Value>(body).map_err(|e| e.to_string()),
        RequestFormat::Xml => xml::from_xml(body).map_err(|e| e.to_string()),
    };

    match decoded {
        Ok(value) => classify(value),
        Err(reason) => {
            debug!(%format, %reason, "response body did not decode, returning it raw");
            NormalizedResponse::Raw(body.to_string())
        }
    }
}

fn classify(value: Value) -> NormalizedResponse {
    match value {
        Value::Array(items) => NormalizedResponse::List(items),
        Value::Object(map) => NormalizedResponse::Object(map),
        other => NormalizedResponse::Scalar(other),
    }
}
