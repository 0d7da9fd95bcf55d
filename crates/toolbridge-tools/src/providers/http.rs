//! Real upstream client using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::ToolError;
use crate::traits::{HttpMethod, UpstreamClient, UpstreamRequest, UpstreamResponse};

/// Upstream client backed by `reqwest`.
pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
}

impl ReqwestUpstreamClient {
    /// Create a client with a per-request timeout and user agent.
    ///
    /// Fails if the underlying client cannot be built, for example when the
    /// user agent is not a valid header value.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// 30 s timeout and a `toolbridge/<version>` user agent.
    pub fn with_defaults() -> Result<Self, ToolError> {
        Self::new(
            Duration::from_secs(30),
            concat!("toolbridge/", env!("CARGO_PKG_VERSION")),
        )
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ToolError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(method = %request.method, url = %request.url, status, "upstream call completed");

        Ok(UpstreamResponse {
            status,
            body: parse_body(&bytes),
        })
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
