//! Railway GraphQL tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;
use toolbridge_settings::RailwaySettings;
use tracing::info;

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest};
use crate::utils::args::required_str;
use crate::utils::expect_success;

const SERVICE: &str = "Railway";

const PROJECTS_QUERY: &str =
    "query { projects { edges { node { id name description updatedAt } } } }";

const REDEPLOY_MUTATION: &str = "mutation Redeploy($serviceId: String!, $environmentId: String!) { \
     serviceInstanceRedeploy(serviceId: $serviceId, environmentId: $environmentId) }";

struct RailwayApi {
    client: Arc<dyn UpstreamClient>,
    settings: RailwaySettings,
}

impl RailwayApi {
    /// Run one GraphQL operation and return its `data` object.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, ToolError> {
        let token = self
            .settings
            .token
            .as_deref()
            .ok_or(ToolError::MissingCredential {
                service: SERVICE,
                variable: "RAILWAY_TOKEN",
            })?;
        let request = UpstreamRequest::post(self.settings.api_base.clone())
            .bearer(token)
            .json(json!({ "query": query, "variables": variables }));
        let response = self.client.send(request).await?;
        let status = response.status;
        let body = expect_success(SERVICE, response)?;

        // GraphQL reports failures with 200 and an `errors` array.
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ToolError::Upstream {
                    message: format!("{SERVICE} GraphQL error: {message}"),
                    status: Some(status),
                    body: Some(body),
                });
            }
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// railway.listProjects
// ─────────────────────────────────────────────────────────────────────────────

/// List projects visible to the token.
pub struct ListProjectsTool {
    api: RailwayApi,
}

impl ListProjectsTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: RailwaySettings) -> Self {
        Self {
            api: RailwayApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for ListProjectsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("railway.listProjects", "List Railway projects").build()
    }

    async fn invoke(&self, _args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let data = self.api.graphql(PROJECTS_QUERY, json!({})).await?;
        let projects: Vec<Value> = data
            .pointer("/projects/edges")
            .and_then(Value::as_array)
            .map(|edges| edges.iter().filter_map(|e| e.get("node").cloned()).collect())
            .unwrap_or_default();
        Ok(json!({ "projects": projects }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// railway.triggerDeploy
// ─────────────────────────────────────────────────────────────────────────────

/// Redeploy a service instance. Mutating.
pub struct TriggerDeployTool {
    api: RailwayApi,
}

impl TriggerDeployTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: RailwaySettings) -> Self {
        Self {
            api: RailwayApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for TriggerDeployTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("railway.triggerDeploy", "Redeploy a Railway service")
            .required_property("service_id", json!({"type": "string", "minLength": 1}))
            .required_property("environment_id", json!({"type": "string", "minLength": 1}))
            .mutating()
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        ctx.guard.ensure_writable()?;
        let service_id = required_str(&args, "service_id")?;
        let environment_id = required_str(&args, "environment_id")?;
        info!(service_id, environment_id, "triggering railway redeploy");

        let data = self
            .api
            .graphql(
                REDEPLOY_MUTATION,
                json!({ "serviceId": service_id, "environmentId": environment_id }),
            )
            .await?;
        Ok(json!({
            "triggered": data.get("serviceInstanceRedeploy").cloned().unwrap_or(Value::Bool(false)),
            "service_id": service_id,
            "environment_id": environment_id,
        }))
    }
}
