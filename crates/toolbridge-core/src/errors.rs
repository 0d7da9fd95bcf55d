//! Bridge error taxonomy.
//!
//! Every failed invocation resolves to exactly one [`BridgeError`] variant.
//! The variant decides the HTTP status, the JSON error body returned to the
//! caller, and the payload of the `tool_error` broadcast event.
//!
//! | Variant | Raised by | HTTP |
//! |---------|-----------|------|
//! | `UnknownTool` | dispatch, before any handler | 400 |
//! | `Validation` | dispatch, before any handler | 400 |
//! | `WriteDisabled` | mutating handler, guard closed | 403 |
//! | `Upstream` | handler, external call failed | 500 |
//! | `Internal` | dispatch boundary (panic, timeout) | 500 |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::tools::FieldError;

/// Stable machine-readable error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Tool name not in the registry.
    UnknownTool,
    /// Arguments failed schema validation.
    ValidationError,
    /// Mutating tool invoked with the write guard closed.
    WriteDisabled,
    /// The handler's upstream call failed.
    UpstreamError,
    /// Handler fault caught at the dispatch boundary.
    InternalError,
}

impl ErrorKind {
    /// The snake-case code string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::ValidationError => "validation_error",
            Self::WriteDisabled => "write_disabled",
            Self::UpstreamError => "upstream_error",
            Self::InternalError => "internal_error",
        }
    }
}

/// Normalized invocation failure.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BridgeError {
    /// Tool name not present in the registry.
    #[error("Unknown tool")]
    UnknownTool {
        /// The requested tool name.
        tool: String,
    },

    /// Arguments did not match the tool's input schema.
    #[error("Invalid arguments")]
    Validation {
        /// The tool being invoked.
        tool: String,
        /// One entry per violated constraint.
        errors: Vec<FieldError>,
    },

    /// A mutating tool was invoked while writes are disabled.
    #[error("Writes are disabled (set ALLOW_WRITES=true to enable)")]
    WriteDisabled {
        /// The tool being invoked.
        tool: String,
    },

    /// The upstream service call failed.
    #[error("{message}")]
    Upstream {
        /// The tool being invoked.
        tool: String,
        /// Human-readable failure description.
        message: String,
        /// Upstream HTTP status, when a response was received.
        status: Option<u16>,
        /// Upstream response body, when one was received.
        body: Option<Value>,
    },

    /// The handler panicked or exceeded the invocation timeout.
    #[error("{message}")]
    Internal {
        /// The tool being invoked.
        tool: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl BridgeError {
    /// Name of the tool the failed invocation targeted.
    pub fn tool(&self) -> &str {
        match self {
            Self::UnknownTool { tool }
            | Self::Validation { tool, .. }
            | Self::WriteDisabled { tool }
            | Self::Upstream { tool, .. }
            | Self::Internal { tool, .. } => tool,
        }
    }

    /// Error code for this variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::WriteDisabled { .. } => ErrorKind::WriteDisabled,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// HTTP status code reported to the direct caller.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::UnknownTool { .. } | Self::Validation { .. } => 400,
            Self::WriteDisabled { .. } => 403,
            Self::Upstream { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Whether the error was raised before any handler ran.
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(self, Self::UnknownTool { .. } | Self::Validation { .. })
    }

    /// Upstream HTTP status, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Upstream response body, if any.
    pub fn upstream_body(&self) -> Option<&Value> {
        match self {
            Self::Upstream { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// JSON body returned to the direct caller.
    ///
    /// Always carries `ok: false`, the display message under `error`, and the
    /// tool name. Validation errors add `errors`; upstream errors add
    /// `upstream_status` and `upstream_body` when known.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        let _ = body.insert("ok".into(), Value::Bool(false));
        let _ = body.insert("error".into(), Value::String(self.to_string()));
        let _ = body.insert("tool".into(), Value::String(self.tool().to_owned()));
        match self {
            Self::Validation { errors, .. } => {
                let _ = body.insert("errors".into(), json!(errors));
            }
            Self::Upstream { status, body: upstream, .. } => {
                if let Some(status) = status {
                    let _ = body.insert("upstream_status".into(), json!(status));
                }
                if let Some(upstream) = upstream {
                    let _ = body.insert("upstream_body".into(), upstream.clone());
                }
            }
            _ => {}
        }
        Value::Object(body)
    }

    /// Payload of the `tool_error` broadcast event: the caller body plus `kind`.
    pub fn to_event_payload(&self) -> Value {
        let mut payload = self.to_body();
        if let Value::Object(map) = &mut payload {
            let _ = map.insert("kind".into(), Value::String(self.kind().as_str().into()));
        }
        payload
    }
}
