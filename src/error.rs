//! # Error Types
//!
//! Only permit-wait failures (`Interrupted`, `Shutdown`, `Timeout`) are hard
//! errors on the permissive submission path. Serialization and transport
//! failures are reported through `tracing` and degrade to an empty result,
//! unless the caller opts into the strict entry point.

use thiserror::Error;

/// Errors produced by the rate limiter and the document client.
#[derive(Debug, Error)]
pub enum CrptError {
    /// The caller was cancelled while waiting for a permit. No permit was consumed.
    #[error("interrupted while waiting for a permit")]
    Interrupted,

    /// The permit pool was closed by `shutdown()`.
    #[error("rate limiter has been shut down")]
    Shutdown,

    /// No permit became available within the requested timeout.
    #[error("timed out waiting for a permit")]
    Timeout,

    /// A document or envelope could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP POST failed.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The refill thread could not be started.
    #[error("failed to spawn refill thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Failures raised by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or I/O failure while sending the request or reading the body.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = CrptError> = std::result::Result<T, E>;
