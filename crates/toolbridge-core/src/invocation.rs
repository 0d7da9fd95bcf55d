//! Invocation request and result types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::BridgeError;

/// Outcome of one tool invocation: the handler payload or a normalized error.
///
/// The same value is returned to the caller and broadcast to subscribers.
pub type InvocationResult = Result<Value, BridgeError>;

/// A single "call tool X with arguments Y" request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Name of the tool to invoke.
    pub tool: String,
    /// Tool arguments. Missing or `null` is treated as `{}`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Map<String, Value>,
    /// Caller-supplied token echoed on the broadcast event.
    #[serde(
        default,
        rename = "stream_id",
        alias = "correlation_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub correlation_id: Option<String>,
}

impl InvocationRequest {
    /// Build a request with no correlation id.
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
            correlation_id: None,
        }
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
