//! Tool and registry error types.
//!
//! [`ToolError`] is what handlers return; [`ToolError::into_bridge`] folds it
//! into the bridge-wide [`BridgeError`] taxonomy at the dispatch boundary.

use serde_json::Value;
use thiserror::Error;
use toolbridge_core::{BridgeError, FieldError};

/// Errors a handler can produce.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Mutating tool invoked while the write guard is closed.
    #[error("Writes are disabled (set ALLOW_WRITES=true to enable)")]
    WriteDisabled,

    /// A credential or endpoint required by the handler is not configured.
    #[error("{service} is not configured (set {variable})")]
    MissingCredential {
        /// Upstream service name.
        service: &'static str,
        /// Setting or env var that supplies it.
        variable: &'static str,
    },

    /// An argument passed the schema but cannot be used.
    #[error("invalid argument {field}: {message}")]
    InvalidArgument {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The upstream answered with a failure.
    #[error("{message}")]
    Upstream {
        /// Human-readable description.
        message: String,
        /// Upstream HTTP status, if a response arrived.
        status: Option<u16>,
        /// Upstream response body, if a response arrived.
        body: Option<Value>,
    },

    /// The request never completed (DNS, connect, TLS, timeout).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Convert into the bridge taxonomy for `tool`.
    pub fn into_bridge(self, tool: &str) -> BridgeError {
        let tool = tool.to_owned();
        match self {
            Self::WriteDisabled => BridgeError::WriteDisabled { tool },
            Self::InvalidArgument { field, message } => BridgeError::Validation {
                tool,
                errors: vec![FieldError::new(field, message)],
            },
            Self::Upstream {
                message,
                status,
                body,
            } => BridgeError::Upstream {
                tool,
                message,
                status,
                body,
            },
            other => BridgeError::Upstream {
                tool,
                message: other.to_string(),
                status: None,
                body: None,
            },
        }
    }
}

/// Errors raised while building the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two handlers declared the same tool name.
    #[error("duplicate tool name: {name}")]
    Duplicate {
        /// The repeated name.
        name: String,
    },

    /// A tool's input schema failed to compile.
    #[error("invalid input schema for {name}: {message}")]
    InvalidSchema {
        /// The tool name.
        name: String,
        /// Compiler message.
        message: String,
    },
}
