//! Orchestrator error taxonomy.

use thiserror::Error;

use dync_core::VersionError;
use dync_runtime::RuntimeError;
use dync_store::StoreError;

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors surfaced by cluster operations.
///
/// DNS registration failures never appear here; they are logged and
/// swallowed at the allocation site.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Rejected before any side effect.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cluster not found: {0}")]
    NotFound(String),

    #[error("cannot kill clusters you don't own")]
    Forbidden,

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("metadata store error: {0}")]
    Store(#[from] StoreError),

    /// A fan-out worker died before reporting a result.
    #[error("worker task failed: {0}")]
    Task(String),
}
