//! # toolbridge-core
//!
//! Foundation types shared by every toolbridge crate.
//!
//! - [`tools`]: tool descriptors and field-level validation errors
//! - [`invocation`]: the invocation request and its normalized result
//! - [`events`]: broadcast events fanned out to stream subscribers
//! - [`errors`]: the [`BridgeError`] taxonomy and its JSON error bodies
//! - [`logging`]: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod invocation;
pub mod logging;
pub mod tools;

pub use errors::{BridgeError, ErrorKind};
pub use events::{BroadcastEvent, EventKind};
pub use invocation::{InvocationRequest, InvocationResult};
pub use tools::{FieldError, ToolDescriptor};
