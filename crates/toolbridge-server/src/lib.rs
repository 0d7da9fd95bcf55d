//! # toolbridge-server
//!
//! Axum HTTP + SSE server for the tool bridge.
//!
//! - `POST /invoke`: synchronous tool invocation through the [`Dispatcher`]
//! - `GET /sse`: live subscriber stream fed by the [`BroadcastHub`]
//! - `POST /mcp/`: minimal MCP JSON-RPC over the same dispatcher
//! - `/healthz`, `/health`, and optional `/metrics`
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod hub;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use errors::ServerError;
pub use hub::BroadcastHub;
pub use server::{AppState, BridgeServer};
pub use shutdown::{DrainReport, ShutdownCoordinator};
