//! Server configuration derived from [`BridgeSettings`].

use std::time::Duration;

use toolbridge_settings::BridgeSettings;

/// Runtime configuration for [`BridgeServer`](crate::server::BridgeServer).
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port (`0` = auto-assign).
    pub port: u16,
    /// Required `x-admin-token` value; `None` disables the check.
    pub admin_token: Option<String>,
    /// Interval between SSE keep-alive pings.
    pub keepalive_interval: Duration,
    /// Per-subscriber queue depth.
    pub subscriber_buffer: usize,
    /// Dropped frames tolerated per subscriber.
    pub max_subscriber_drops: u64,
    /// Upper bound on one handler invocation.
    pub invocation_timeout: Duration,
    /// Request body limit.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Build from loaded settings. Empty admin tokens disable auth.
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        let server = &settings.server;
        Self {
            host: server.host.clone(),
            port: server.port,
            admin_token: server.admin_token.clone().filter(|t| !t.is_empty()),
            keepalive_interval: Duration::from_millis(server.sse_keepalive_ms),
            subscriber_buffer: server.subscriber_buffer,
            max_subscriber_drops: server.max_subscriber_drops,
            invocation_timeout: Duration::from_millis(server.invocation_timeout_ms),
            max_body_bytes: server.max_body_bytes,
        }
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            ..Self::from_settings(&BridgeSettings::default())
        }
    }
}
