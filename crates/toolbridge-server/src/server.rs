//! `BridgeServer`: Axum HTTP + SSE server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use toolbridge_core::BroadcastEvent;
use toolbridge_tools::{ToolRegistry, WriteGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::errors::ServerError;
use crate::hub::{BroadcastHub, Frame};
use crate::routes::{auth, health, invoke, mcp, sse};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Invocation pipeline.
    pub dispatcher: Arc<Dispatcher>,
    /// Subscriber registry.
    pub hub: Arc<BroadcastHub>,
    /// Pre-rendered manifest frame sent to each new subscriber.
    pub manifest: Arc<Frame>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Root shutdown token.
    pub shutdown: CancellationToken,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The tool bridge server.
pub struct BridgeServer {
    config: Arc<ServerConfig>,
    dispatcher: Arc<Dispatcher>,
    hub: Arc<BroadcastHub>,
    manifest: Arc<Frame>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl BridgeServer {
    /// Create a server over a frozen registry.
    pub fn new(config: ServerConfig, registry: ToolRegistry, guard: WriteGuard) -> Self {
        let hub = Arc::new(BroadcastHub::new(
            config.subscriber_buffer,
            config.max_subscriber_drops,
        ));
        let manifest = Arc::new(Frame::from_event(&BroadcastEvent::manifest(
            registry.manifest().clone(),
        )));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(registry),
            hub.clone(),
            guard,
            config.invocation_timeout,
        ));
        Self {
            config: Arc::new(config),
            dispatcher,
            hub,
            manifest,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Expose `GET /metrics` from this handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    fn state(&self) -> AppState {
        AppState {
            dispatcher: self.dispatcher.clone(),
            hub: self.hub.clone(),
            manifest: self.manifest.clone(),
            config: self.config.clone(),
            shutdown: self.shutdown.token(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = self.state();

        let protected = Router::new()
            .route("/invoke", post(invoke::invoke))
            .route(
                "/sse",
                get(sse::stream)
                    .head(sse::head)
                    .options(sse::options)
                    .post(sse::post_not_allowed),
            )
            .route("/mcp", post(mcp::rpc).fallback(mcp::use_post))
            .route("/mcp/", post(mcp::rpc).fallback(mcp::use_post))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin_token,
            ));

        let mut router = Router::new()
            .route("/healthz", get(health::healthz))
            .route("/health", get(health::redirect))
            .merge(protected);
        if self.metrics.is_some() {
            router = router.route("/metrics", get(health::metrics));
        }

        router
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Serve on `listener` until shutdown is signalled.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let token = self.shutdown.token();
        let hub = self.hub.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                token.cancelled().await;
                hub.close_all();
            })
            .await?;
        info!("server stopped");
        Ok(())
    }

    /// Bind the configured address and serve in a background task tracked by
    /// the shutdown coordinator.
    pub async fn listen(self: &Arc<Self>) -> Result<SocketAddr, ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let server = self.clone();
        self.shutdown.track(tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!(error = %e, "server exited with error");
            }
        }));
        info!(%local, tools = self.dispatcher.registry().len(), "listening");
        Ok(local)
    }

    /// Subscriber registry.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Invocation pipeline.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
