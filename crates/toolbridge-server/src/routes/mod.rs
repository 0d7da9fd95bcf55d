//! HTTP route handlers.

pub mod auth;
pub mod health;
pub mod invoke;
pub mod mcp;
pub mod sse;
