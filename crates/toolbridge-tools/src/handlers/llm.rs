//! `llm.complete`: single-turn completion against OpenAI or Anthropic.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;
use toolbridge_settings::LlmSettings;
use tracing::debug;

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest};
use crate::utils::args::{optional_str, optional_u64, required_str};
use crate::utils::expect_success;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u64 = 1024;

/// Supported completion backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    fn parse(raw: Option<&str>) -> Result<Self, ToolError> {
        match raw.unwrap_or("openai") {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ToolError::InvalidArgument {
                field: "provider".into(),
                message: format!("unsupported provider `{other}`"),
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

struct Completion<'a> {
    model: &'a str,
    prompt: &'a str,
    system: Option<&'a str>,
    max_tokens: u64,
}

/// Run a prompt through a configured LLM provider.
pub struct CompleteTool {
    client: Arc<dyn UpstreamClient>,
    settings: LlmSettings,
}

impl CompleteTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    fn openai_request(&self, c: &Completion<'_>) -> Result<UpstreamRequest, ToolError> {
        let key = self
            .settings
            .openai_api_key
            .as_deref()
            .ok_or(ToolError::MissingCredential {
                service: "OpenAI",
                variable: "OPENAI_API_KEY",
            })?;
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = c.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": c.prompt}));
        Ok(UpstreamRequest::post(format!(
            "{}/chat/completions",
            self.settings.openai_base.trim_end_matches('/')
        ))
        .bearer(key)
        .json(json!({
            "model": c.model,
            "messages": messages,
            "max_tokens": c.max_tokens,
        })))
    }

    fn anthropic_request(&self, c: &Completion<'_>) -> Result<UpstreamRequest, ToolError> {
        let key = self
            .settings
            .anthropic_api_key
            .as_deref()
            .ok_or(ToolError::MissingCredential {
                service: "Anthropic",
                variable: "ANTHROPIC_API_KEY",
            })?;
        let mut body = json!({
            "model": c.model,
            "max_tokens": c.max_tokens,
            "messages": [{"role": "user", "content": c.prompt}],
        });
        if let Some(system) = c.system {
            body["system"] = json!(system);
        }
        Ok(UpstreamRequest::post(format!(
            "{}/messages",
            self.settings.anthropic_base.trim_end_matches('/')
        ))
        .header("x-api-key", key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(body))
    }
}

/// Pull the generated text out of a provider response.
fn extract_text(provider: Provider, body: &Value) -> String {
    match provider {
        Provider::OpenAi => body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        Provider::Anthropic => body
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default(),
    }
}

#[async_trait]
impl ToolHandler for CompleteTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("llm.complete", "Complete a prompt with an LLM provider")
            .required_property("prompt", json!({"type": "string", "minLength": 1}))
            .property("provider", json!({"type": "string", "enum": ["openai", "anthropic"]}))
            .property("model", json!({"type": "string", "minLength": 1}))
            .property("system", json!({"type": "string"}))
            .property("max_tokens", json!({"type": "integer", "minimum": 1, "maximum": 32000}))
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let provider = Provider::parse(optional_str(&args, "provider"))?;
        let default_model = match provider {
            Provider::OpenAi => self.settings.openai_model.as_str(),
            Provider::Anthropic => self.settings.anthropic_model.as_str(),
        };
        let completion = Completion {
            model: optional_str(&args, "model").unwrap_or(default_model),
            prompt: required_str(&args, "prompt")?,
            system: optional_str(&args, "system"),
            max_tokens: optional_u64(&args, "max_tokens").unwrap_or(DEFAULT_MAX_TOKENS),
        };
        let request = match provider {
            Provider::OpenAi => self.openai_request(&completion)?,
            Provider::Anthropic => self.anthropic_request(&completion)?,
        };

        debug!(provider = provider.as_str(), model = completion.model, "requesting completion");
        let service = match provider {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        };
        let body = expect_success(service, self.client.send(request).await?)?;
        Ok(json!({
            "provider": provider.as_str(),
            "model": body.get("model").and_then(Value::as_str).unwrap_or(completion.model),
            "text": extract_text(provider, &body),
            "usage": body.get("usage").cloned().unwrap_or(Value::Null),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RecordingClient;

    fn settings() -> LlmSettings {
        LlmSettings {
            openai_api_key: Some("sk-openai".into()),
            anthropic_api_key: Some("sk-ant".into()),
            ..LlmSettings::default()
        }
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn openai_is_the_default_provider() {
        let client = Arc::new(RecordingClient::new());
        client.push_response(
            200,
            json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "four"}}],
                "usage": {"total_tokens": 12}
            }),
        );
        let tool = CompleteTool::new(client.clone(), settings());
        let out = tool
            .invoke(args(json!({"prompt": "2+2?", "system": "be terse"})), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out["provider"], "openai");
        assert_eq!(out["text"], "four");
        assert_eq!(out["usage"]["total_tokens"], 12);

        let sent = &client.requests()[0];
        assert!(sent.url.ends_with("/chat/completions"));
        assert_eq!(sent.header_value("authorization"), Some("Bearer sk-openai"));
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[tokio::test]
    async fn anthropic_uses_messages_api() {
        let client = Arc::new(RecordingClient::new());
        client.push_response(
            200,
            json!({
                "content": [{"type": "text", "text": "hello "}, {"type": "text", "text": "there"}],
                "usage": {"input_tokens": 3, "output_tokens": 2}
            }),
        );
        let tool = CompleteTool::new(client.clone(), settings());
        let out = tool
            .invoke(
                args(json!({"provider": "anthropic", "prompt": "hi", "max_tokens": 50})),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out["text"], "hello there");
        assert_eq!(out["model"], LlmSettings::default().anthropic_model);

        let sent = &client.requests()[0];
        assert!(sent.url.ends_with("/messages"));
        assert_eq!(sent.header_value("x-api-key"), Some("sk-ant"));
        assert_eq!(sent.header_value("anthropic-version"), Some(ANTHROPIC_VERSION));
        assert_eq!(sent.body.as_ref().unwrap()["max_tokens"], 50);
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling() {
        let client = Arc::new(RecordingClient::new());
        let tool = CompleteTool::new(client.clone(), LlmSettings::default());
        let err = tool
            .invoke(args(json!({"prompt": "hi"})), &ToolContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI is not configured (set OPENAI_API_KEY)");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_error_is_upstream() {
        let client = Arc::new(RecordingClient::new());
        client.push_response(429, json!({"error": {"message": "Rate limit reached"}}));
        let tool = CompleteTool::new(client, settings());
        let err = tool
            .invoke(args(json!({"prompt": "hi"})), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Upstream { status: Some(429), .. }));
    }
}
