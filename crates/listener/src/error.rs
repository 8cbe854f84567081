//! Errors raised while running the webhook server.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that stop the webhook server.
///
/// Failures while processing an individual push never surface here; they are
/// turned into HTTP 500 responses by the request handler.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listening socket could not be bound.
    #[error("Cannot bind webhook listener to {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O failure.
    #[error("Webhook listener failed: {0}")]
    Serve(#[from] std::io::Error),
}
