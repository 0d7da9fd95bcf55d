//! # toolbridge-settings
//!
//! Layered configuration for the tool bridge.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BridgeSettings::default()`]
//! 2. **Settings file**: `~/.toolbridge/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `PORT`, `ADMIN_TOKEN`, `ALLOW_WRITES`,
//!    provider tokens (highest priority)
//!
//! The server receives the resulting [`BridgeSettings`] as a plain value at
//! startup; nothing reads the environment after that.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path,
    load_settings_with_env, settings_path,
};
pub use types::*;
