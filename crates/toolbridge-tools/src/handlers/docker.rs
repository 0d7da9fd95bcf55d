//! Docker Hub registry and Docker Engine tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;
use toolbridge_settings::{DockerEngineSettings, DockerHubSettings};
use tracing::{info, warn};

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest};
use crate::utils::args::{optional_bool, optional_str, optional_strings, optional_u64, required_str};
use crate::utils::expect_success;

// ─────────────────────────────────────────────────────────────────────────────
// dockerhub.listTags
// ─────────────────────────────────────────────────────────────────────────────

/// List tags of a Docker Hub repository.
pub struct ListTagsTool {
    client: Arc<dyn UpstreamClient>,
    settings: DockerHubSettings,
}

impl ListTagsTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: DockerHubSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ToolHandler for ListTagsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("dockerhub.listTags", "List tags for a Docker Hub repository")
            .required_property("repository", json!({"type": "string", "minLength": 1}))
            .property(
                "namespace",
                json!({"type": "string", "description": "Owner; defaults to `library`"}),
            )
            .property("page_size", json!({"type": "integer", "minimum": 1, "maximum": 100}))
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let repository = required_str(&args, "repository")?;
        let namespace = optional_str(&args, "namespace").unwrap_or("library");
        let page_size = optional_u64(&args, "page_size").unwrap_or(25);

        let url = format!(
            "{}/v2/repositories/{namespace}/{repository}/tags",
            self.settings.api_base.trim_end_matches('/')
        );
        let mut request = UpstreamRequest::get(url).query("page_size", page_size);
        if let Some(token) = self.settings.token.as_deref() {
            request = request.bearer(token);
        }

        let response = self.client.send(request).await?;
        let body = expect_success("Docker Hub", response)?;
        let tags: Vec<Value> = body
            .get("results")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.get("name"),
                            "last_updated": t.get("last_updated"),
                            "full_size": t.get("full_size"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({
            "repository": format!("{namespace}/{repository}"),
            "count": body.get("count").cloned().unwrap_or(Value::Null),
            "tags": tags,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Docker Engine
// ─────────────────────────────────────────────────────────────────────────────

const ENGINE: &str = "Docker Engine";

/// Resolve the Engine API base from `DOCKER_HOST`. Only TCP endpoints are
/// reachable over HTTP; unix sockets are rejected.
fn engine_base(settings: &DockerEngineSettings) -> Result<String, ToolError> {
    let raw = settings
        .engine_url
        .as_deref()
        .ok_or(ToolError::MissingCredential {
            service: ENGINE,
            variable: "DOCKER_HOST",
        })?;
    let base = if let Some(rest) = raw.strip_prefix("tcp://") {
        format!("http://{rest}")
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_owned()
    } else {
        return Err(ToolError::Upstream {
            message: format!("{ENGINE} endpoint `{raw}` is not reachable over TCP"),
            status: None,
            body: None,
        });
    };
    Ok(base.trim_end_matches('/').to_owned())
}

/// List containers on the configured engine.
pub struct ListContainersTool {
    client: Arc<dyn UpstreamClient>,
    settings: DockerEngineSettings,
}

impl ListContainersTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: DockerEngineSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ToolHandler for ListContainersTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("docker.listContainers", "List containers on the Docker engine")
            .property(
                "all",
                json!({"type": "boolean", "description": "Include stopped containers"}),
            )
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let base = engine_base(&self.settings)?;
        let all = optional_bool(&args, "all").unwrap_or(false);
        let request = UpstreamRequest::get(format!("{base}/containers/json")).query("all", all);

        let response = self.client.send(request).await?;
        let body = expect_success(ENGINE, response)?;
        let containers: Vec<Value> = body
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|c| {
                        json!({
                            "id": c.get("Id"),
                            "names": c.get("Names"),
                            "image": c.get("Image"),
                            "state": c.get("State"),
                            "status": c.get("Status"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({ "containers": containers }))
    }
}

/// Create and start a container. Mutating.
pub struct RunContainerTool {
    client: Arc<dyn UpstreamClient>,
    settings: DockerEngineSettings,
}

impl RunContainerTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: DockerEngineSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ToolHandler for RunContainerTool {
    fn descriptor(&self) -> ToolDescriptor {
        let strings = json!({"type": "array", "items": {"type": "string"}});
        ToolSchemaBuilder::new("docker.runContainer", "Create and start a container")
            .required_property("image", json!({"type": "string", "minLength": 1}))
            .property("name", json!({"type": "string", "pattern": "^[a-zA-Z0-9][a-zA-Z0-9_.-]*$"}))
            .property("cmd", strings.clone())
            .property("env", strings)
            .mutating()
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        ctx.guard.ensure_writable()?;
        let base = engine_base(&self.settings)?;
        let image = required_str(&args, "image")?;

        let mut spec = json!({ "Image": image });
        if let Some(cmd) = optional_strings(&args, "cmd") {
            spec["Cmd"] = json!(cmd);
        }
        if let Some(env) = optional_strings(&args, "env") {
            spec["Env"] = json!(env);
        }
        let mut create = UpstreamRequest::post(format!("{base}/containers/create")).json(spec);
        if let Some(name) = optional_str(&args, "name") {
            create = create.query("name", name);
        }

        let created = expect_success(ENGINE, self.client.send(create).await?)?;
        let id = created
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Upstream {
                message: format!("{ENGINE} create response has no Id"),
                status: None,
                body: Some(created.clone()),
            })?
            .to_owned();
        let warnings = created.get("Warnings").cloned().unwrap_or(json!([]));

        let start = UpstreamRequest::post(format!("{base}/containers/{id}/start"));
        if let Err(e) = expect_success(ENGINE, self.client.send(start).await?) {
            warn!(container = %id, error = %e, "container created but failed to start");
            return Err(e);
        }
        info!(container = %id, image, "container started");
        Ok(json!({ "id": id, "started": true, "warnings": warnings }))
    }
}
