//! Discord REST tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;
use toolbridge_settings::DiscordSettings;
use tracing::debug;

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest};
use crate::utils::args::{optional_str, optional_u64, required_str};
use crate::utils::expect_success;

const SERVICE: &str = "Discord";

fn channel_property() -> Value {
    json!({
        "type": "string",
        "pattern": "^[0-9]+$",
        "description": "Channel snowflake; defaults to the configured channel"
    })
}

/// Shared Discord plumbing.
struct DiscordApi {
    client: Arc<dyn UpstreamClient>,
    settings: DiscordSettings,
}

impl DiscordApi {
    fn channel<'a>(&'a self, args: &'a Map<String, Value>) -> Result<&'a str, ToolError> {
        optional_str(args, "channel_id")
            .or(self.settings.default_channel_id.as_deref())
            .ok_or_else(|| ToolError::InvalidArgument {
                field: "channel_id".into(),
                message: "no channel given and DISCORD_CHANNEL_ID is not set".into(),
            })
    }

    fn authorized(&self, request: UpstreamRequest) -> Result<UpstreamRequest, ToolError> {
        let token = self
            .settings
            .bot_token
            .as_deref()
            .ok_or(ToolError::MissingCredential {
                service: SERVICE,
                variable: "DISCORD_BOT_TOKEN",
            })?;
        Ok(request.header("Authorization", format!("Bot {token}")))
    }

    fn messages_url(&self, channel: &str) -> String {
        format!(
            "{}/channels/{channel}/messages",
            self.settings.api_base.trim_end_matches('/')
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// discord.sendMessage
// ─────────────────────────────────────────────────────────────────────────────

/// Post a message to a channel. Mutating.
pub struct SendMessageTool {
    api: DiscordApi,
}

impl SendMessageTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: DiscordSettings) -> Self {
        Self {
            api: DiscordApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for SendMessageTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("discord.sendMessage", "Post a message to a Discord channel")
            .required_property(
                "content",
                json!({"type": "string", "minLength": 1, "maxLength": 2000, "description": "Message text"}),
            )
            .property("channel_id", channel_property())
            .mutating()
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        ctx.guard.ensure_writable()?;
        let content = required_str(&args, "content")?;
        let channel = self.api.channel(&args)?;
        let request = self
            .api
            .authorized(UpstreamRequest::post(self.api.messages_url(channel)))?
            .json(json!({ "content": content }));

        debug!(channel, "sending discord message");
        let response = self.api.client.send(request).await?;
        let message = expect_success(SERVICE, response)?;
        Ok(json!({
            "ok": true,
            "channel_id": channel,
            "message_id": message.get("id").cloned().unwrap_or(Value::Null),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// discord.getMessages
// ─────────────────────────────────────────────────────────────────────────────

/// Read recent messages from a channel.
pub struct GetMessagesTool {
    api: DiscordApi,
}

impl GetMessagesTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: DiscordSettings) -> Self {
        Self {
            api: DiscordApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for GetMessagesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("discord.getMessages", "Read recent messages from a Discord channel")
            .property("channel_id", channel_property())
            .property(
                "limit",
                json!({"type": "integer", "minimum": 1, "maximum": 100, "description": "Messages to return (default 20)"}),
            )
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let channel = self.api.channel(&args)?;
        let limit = optional_u64(&args, "limit").unwrap_or(20);
        let request = self
            .api
            .authorized(UpstreamRequest::get(self.api.messages_url(channel)))?
            .query("limit", limit);

        let response = self.api.client.send(request).await?;
        let messages = expect_success(SERVICE, response)?;
        let messages: Vec<Value> = messages
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|m| {
                        json!({
                            "id": m.get("id"),
                            "author": m.pointer("/author/username"),
                            "content": m.get("content"),
                            "timestamp": m.get("timestamp"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({ "channel_id": channel, "messages": messages }))
    }
}
