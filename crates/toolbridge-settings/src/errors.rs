//! Why a settings load was refused.

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failure. Each variant names where the bad input came
/// from so the operator can fix it without reading logs.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("{} is not valid settings JSON: {source}", .path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Location and cause of the parse failure.
        source: serde_json::Error,
    },

    /// Merged settings do not fit the expected shape, e.g. a string where a
    /// port number belongs.
    #[error("settings have the wrong shape: {0}")]
    Convert(#[from] serde_json::Error),

    /// A value parsed but would leave the bridge unusable.
    #[error("{key} {reason}")]
    Rejected {
        /// camelCase path of the offending key, e.g. `server.sseKeepaliveMs`.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
