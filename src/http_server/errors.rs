//! HTTP server errors

use std::io;

use thiserror::Error;

/// Errors raised while starting or running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configured host/port is not a socket address
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Server loop terminated with an error
    #[error("Server error: {0}")]
    Serve(#[from] io::Error),
}
