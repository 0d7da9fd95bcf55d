//! Server lifecycle errors.

use thiserror::Error;

/// Failures starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
