//! Settings type definitions.

mod server;
mod upstream;

pub use server::{GuardSettings, LoggingSettings, ServerSettings};
pub use upstream::{
    DiscordSettings, DockerEngineSettings, DockerHubSettings, GithubSettings, LlmSettings,
    RailwaySettings, UpstreamSettings,
};

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// HTTP listener, SSE, and dispatch settings.
    pub server: ServerSettings,
    /// Write guard policy.
    pub guard: GuardSettings,
    /// Logging level and format.
    pub logging: LoggingSettings,
    /// Upstream provider credentials and endpoints.
    pub upstream: UpstreamSettings,
}

impl BridgeSettings {
    /// Reject values that would make the server unusable.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.sse_keepalive_ms == 0 {
            return Err(crate::SettingsError::Rejected {
                key: "server.sseKeepaliveMs",
                reason: "must be greater than zero",
            });
        }
        if self.server.subscriber_buffer == 0 {
            return Err(crate::SettingsError::Rejected {
                key: "server.subscriberBuffer",
                reason: "must be greater than zero",
            });
        }
        if self.server.invocation_timeout_ms == 0 {
            return Err(crate::SettingsError::Rejected {
                key: "server.invocationTimeoutMs",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(BridgeSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_keepalive_rejected() {
        let mut settings = BridgeSettings::default();
        settings.server.sse_keepalive_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sseKeepaliveMs"));
    }

    #[test]
    fn zero_buffer_rejected() {
        let mut settings = BridgeSettings::default();
        settings.server.subscriber_buffer = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let v = serde_json::to_value(BridgeSettings::default()).unwrap();
        assert!(v["server"].get("sseKeepaliveMs").is_some());
        assert!(v["guard"].get("allowWrites").is_some());
        assert!(v["upstream"]["discord"].get("apiBase").is_some());
    }
}
