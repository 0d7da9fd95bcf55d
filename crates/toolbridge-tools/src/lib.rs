//! # toolbridge-tools
//!
//! Tool contract, registry, and the built-in upstream handlers.
//!
//! - [`traits`]: [`ToolHandler`] and the [`UpstreamClient`] transport seam
//! - [`registry`]: the immutable [`ToolRegistry`] and its builder
//! - [`validator`]: JSON Schema validation of invocation arguments
//! - [`guard`]: the process-wide [`WriteGuard`]
//! - [`handlers`]: Discord, GitHub, Railway, Docker, and LLM tools
//! - [`providers`]: the reqwest-backed client (and a recording client for tests)

#![deny(unsafe_code)]

pub mod errors;
pub mod guard;
pub mod handlers;
pub mod providers;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod utils;
pub mod validator;

pub use errors::{RegistryError, ToolError};
pub use guard::WriteGuard;
pub use handlers::{builtin_registry, register_builtin};
pub use providers::ReqwestUpstreamClient;
pub use registry::{RegisteredTool, ToolRegistry, ToolRegistryBuilder};
pub use schema::ToolSchemaBuilder;
pub use traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest, UpstreamResponse};
pub use validator::ArgumentValidator;
