//! Container runtime error types.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur when driving the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The addressed container does not exist (any more). Teardown paths
    /// treat this as success.
    #[error("no such container: {0}")]
    NotFound(String),

    #[error("container name already in use: {0}")]
    Conflict(String),

    #[error("runtime connection error: {0}")]
    Connection(String),

    #[error("runtime api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected runtime response: {0}")]
    Protocol(String),
}
