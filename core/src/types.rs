//! Payload DTOs sent to the scaffold API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Remote method invocation on a scaffold.
///
/// Targets a record by name or by id (setting one clears the other), or the
/// scaffold's model class when neither is set. `method_args` is the
/// serialized argument list or mapping the remote method expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
    pub method_name: String,
    #[serde(default = "empty_args")]
    pub method_args: Value,
}

fn empty_args() -> Value {
    Value::Array(Vec::new())
}

impl ExecuteRequest {
    /// A class-level call with no arguments.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            record_name: None,
            record_id: None,
            method_name: method_name.into(),
            method_args: empty_args(),
        }
    }

    pub fn on_record_id(mut self, id: u64) -> Self {
        self.record_id = Some(id);
        self.record_name = None;
        self
    }

    pub fn on_record_name(mut self, name: impl Into<String>) -> Self {
        self.record_name = Some(name.into());
        self.record_id = None;
        self
    }

    pub fn args(mut self, args: Value) -> Self {
        self.method_args = args;
        self
    }

    pub fn serialized_args<A: Serialize + ?Sized>(self, args: &A) -> Result<Self> {
        let args = serde_json::to_value(args).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(self.args(args))
    }
}
