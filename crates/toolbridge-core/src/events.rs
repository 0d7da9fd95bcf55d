//! Events fanned out to stream subscribers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::invocation::InvocationResult;

/// Kind of broadcast event; doubles as the SSE `event:` name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Tool listing, sent once to each new subscriber.
    Manifest,
    /// Successful invocation.
    ToolResult,
    /// Failed invocation.
    ToolError,
}

impl EventKind {
    /// The snake-case event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::ToolResult => "tool_result",
            Self::ToolError => "tool_error",
        }
    }
}

/// A transient event pushed to every live subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    /// What happened.
    pub kind: EventKind,
    /// Tool the event refers to (absent for the manifest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Correlation id of the originating invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Event body.
    pub payload: Value,
}

impl BroadcastEvent {
    /// Manifest event carrying `{"tools": [...]}`.
    pub fn manifest(payload: Value) -> Self {
        Self {
            kind: EventKind::Manifest,
            tool: None,
            correlation_id: None,
            payload,
        }
    }

    /// Event mirroring an invocation outcome.
    ///
    /// Success carries the handler payload unchanged; failure carries the
    /// error body plus its `kind` code.
    pub fn from_result(
        tool: &str,
        correlation_id: Option<String>,
        result: &InvocationResult,
    ) -> Self {
        let (kind, payload) = match result {
            Ok(payload) => (EventKind::ToolResult, payload.clone()),
            Err(err) => (EventKind::ToolError, err.to_event_payload()),
        };
        Self {
            kind,
            tool: Some(tool.to_owned()),
            correlation_id,
            payload,
        }
    }
}
