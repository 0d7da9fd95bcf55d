//! Built-in tool handlers.
//!
//! Every handler shares one [`UpstreamClient`]; credentials come from
//! [`UpstreamSettings`]. Tools whose credentials are absent are still
//! registered and fail at invocation with a clear message.

pub mod discord;
pub mod docker;
pub mod github;
pub mod llm;
pub mod ping;
pub mod railway;

use std::sync::Arc;

use toolbridge_settings::UpstreamSettings;
use tracing::info;

use crate::errors::RegistryError;
use crate::registry::{ToolRegistry, ToolRegistryBuilder};
use crate::traits::UpstreamClient;

/// Register every built-in tool, in manifest order.
pub fn register_builtin(
    builder: &mut ToolRegistryBuilder,
    settings: &UpstreamSettings,
    client: &Arc<dyn UpstreamClient>,
) -> Result<(), RegistryError> {
    let _ = builder
        .register(Arc::new(ping::PingTool))?
        .register(Arc::new(discord::SendMessageTool::new(client.clone(), settings.discord.clone())))?
        .register(Arc::new(discord::GetMessagesTool::new(client.clone(), settings.discord.clone())))?
        .register(Arc::new(github::GetRepoTool::new(client.clone(), settings.github.clone())))?
        .register(Arc::new(github::ListIssuesTool::new(client.clone(), settings.github.clone())))?
        .register(Arc::new(github::CreateIssueTool::new(client.clone(), settings.github.clone())))?
        .register(Arc::new(railway::ListProjectsTool::new(client.clone(), settings.railway.clone())))?
        .register(Arc::new(railway::TriggerDeployTool::new(client.clone(), settings.railway.clone())))?
        .register(Arc::new(docker::ListTagsTool::new(client.clone(), settings.dockerhub.clone())))?
        .register(Arc::new(docker::ListContainersTool::new(client.clone(), settings.docker.clone())))?
        .register(Arc::new(docker::RunContainerTool::new(client.clone(), settings.docker.clone())))?
        .register(Arc::new(llm::CompleteTool::new(client.clone(), settings.llm.clone())))?;
    Ok(())
}

/// Build a registry holding only the built-in tools.
pub fn builtin_registry(
    settings: &UpstreamSettings,
    client: Arc<dyn UpstreamClient>,
) -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistry::builder();
    register_builtin(&mut builder, settings, &client)?;
    let registry = builder.build();
    info!(tools = registry.len(), "built-in tools registered");
    Ok(registry)
}
