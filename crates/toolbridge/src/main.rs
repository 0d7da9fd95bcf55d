//! # toolbridge
//!
//! Tool bridge server binary. Loads settings, builds the tool registry and
//! serves HTTP + SSE until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use toolbridge_core::logging::init_subscriber;
use toolbridge_server::shutdown::DEFAULT_DRAIN_TIMEOUT;
use toolbridge_server::{BridgeServer, ServerConfig};
use toolbridge_settings::BridgeSettings;
use toolbridge_tools::{ReqwestUpstreamClient, UpstreamClient, WriteGuard, builtin_registry};

/// Tool bridge server.
#[derive(Parser, Debug)]
#[command(name = "toolbridge", about = "HTTP + SSE bridge to upstream tool APIs")]
struct Cli {
    /// Settings file (defaults to `~/.toolbridge/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Enable mutating tools regardless of settings.
    #[arg(long)]
    allow_writes: bool,
}

impl Cli {
    fn load_settings(&self) -> Result<BridgeSettings> {
        let mut settings = match &self.config {
            Some(path) => toolbridge_settings::load_settings_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => toolbridge_settings::load_settings().context("Failed to load settings")?,
        };
        self.apply_overrides(&mut settings);
        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut BridgeSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.allow_writes {
            settings.guard.allow_writes = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    init_subscriber(&settings.logging.level, settings.logging.format);

    let upstream = &settings.upstream;
    let client: Arc<dyn UpstreamClient> = Arc::new(
        ReqwestUpstreamClient::new(
            Duration::from_millis(upstream.request_timeout_ms),
            &upstream.user_agent,
        )
        .context("Failed to build upstream HTTP client")?,
    );
    let registry = builtin_registry(upstream, client).context("Failed to build tool registry")?;
    let guard = WriteGuard::new(settings.guard.allow_writes);

    let mut server = BridgeServer::new(ServerConfig::from_settings(&settings), registry, guard);
    match toolbridge_server::metrics::install_recorder() {
        Ok(handle) => server = server.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "metrics recorder unavailable, /metrics disabled"),
    }
    let server = Arc::new(server);

    let addr = server.listen().await.context("Failed to start server")?;
    tracing::info!(
        %addr,
        allow_writes = guard.is_write_allowed(),
        tools = server.dispatcher().registry().len(),
        "toolbridge listening"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    tracing::info!("shutdown requested");
    let report = server.shutdown().drain(DEFAULT_DRAIN_TIMEOUT).await;
    tracing::info!(completed = report.completed, aborted = report.aborted, "stopped");
    Ok(())
}
