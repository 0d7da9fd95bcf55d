//! `ping`: liveness tool with no upstream.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler};

/// Returns `{"pong": true, "ts": <now>}`; never cached.
pub struct PingTool;

#[async_trait]
impl ToolHandler for PingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("ping", "Return pong with the current server time").build()
    }

    async fn invoke(&self, _args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!({
            "pong": true,
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }))
    }
}
