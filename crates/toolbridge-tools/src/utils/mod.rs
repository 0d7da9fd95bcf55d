//! Shared helpers for handlers.

pub mod args;
pub mod response;

pub use response::expect_success;
