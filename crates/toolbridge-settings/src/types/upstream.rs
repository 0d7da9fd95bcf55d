//! Upstream provider credentials and endpoints.
//!
//! Tokens are optional: a handler whose credential is missing fails its
//! invocation with an upstream error instead of preventing startup.

use serde::{Deserialize, Serialize};

/// Settings for every upstream provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamSettings {
    /// Per-request timeout for outbound HTTP calls in milliseconds.
    pub request_timeout_ms: u64,
    /// `User-Agent` header sent upstream.
    pub user_agent: String,
    /// Discord REST API.
    pub discord: DiscordSettings,
    /// GitHub REST API.
    pub github: GithubSettings,
    /// Railway GraphQL API.
    pub railway: RailwaySettings,
    /// Docker Hub registry API.
    pub dockerhub: DockerHubSettings,
    /// Docker Engine API.
    pub docker: DockerEngineSettings,
    /// LLM providers.
    pub llm: LlmSettings,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            user_agent: concat!("toolbridge/", env!("CARGO_PKG_VERSION")).to_string(),
            discord: DiscordSettings::default(),
            github: GithubSettings::default(),
            railway: RailwaySettings::default(),
            dockerhub: DockerHubSettings::default(),
            docker: DockerEngineSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

/// Discord bot settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordSettings {
    /// Bot token (sent as `Authorization: Bot <token>`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Channel used when a call omits `channel_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel_id: Option<String>,
    /// REST base URL.
    pub api_base: String,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            default_channel_id: None,
            api_base: "https://discord.com/api/v10".to_string(),
        }
    }
}

/// GitHub settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GithubSettings {
    /// Personal access token. Reads work without one (rate limited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// REST base URL.
    pub api_base: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
        }
    }
}

/// Railway settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RailwaySettings {
    /// API token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// GraphQL endpoint.
    pub api_base: String,
}

impl Default for RailwaySettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://backboard.railway.app/graphql/v2".to_string(),
        }
    }
}

/// Docker Hub settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerHubSettings {
    /// Optional bearer token for private repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Hub API base URL.
    pub api_base: String,
}

impl Default for DockerHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://hub.docker.com".to_string(),
        }
    }
}

/// Docker Engine settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerEngineSettings {
    /// Engine endpoint (`http://`, `https://`, or `tcp://`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,
}

/// LLM provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// OpenAI API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible base URL.
    pub openai_base: String,
    /// Model used for OpenAI when the call names none.
    pub openai_model: String,
    /// Anthropic API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    /// Anthropic base URL.
    pub anthropic_base: String,
    /// Model used for Anthropic when the call names none.
    pub anthropic_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            anthropic_api_key: None,
            anthropic_base: "https://api.anthropic.com/v1".to_string(),
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}
