//! Server, guard, and logging settings.

use serde::{Deserialize, Serialize};
use toolbridge_core::logging::LogFormat;

/// HTTP listener, SSE, and dispatch settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Shared secret required in `x-admin-token` on privileged routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    /// Interval between SSE keep-alive pings in milliseconds.
    pub sse_keepalive_ms: u64,
    /// Per-subscriber outbound queue capacity.
    pub subscriber_buffer: usize,
    /// Dropped events tolerated before a subscriber is disconnected.
    pub max_subscriber_drops: u64,
    /// Upper bound on a single handler invocation in milliseconds.
    pub invocation_timeout_ms: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            admin_token: None,
            sse_keepalive_ms: 30_000,
            subscriber_buffer: 64,
            max_subscriber_drops: 100,
            invocation_timeout_ms: 60_000,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Write guard policy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardSettings {
    /// Allow mutating tools to reach their upstream. Closed by default.
    pub allow_writes: bool,
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
