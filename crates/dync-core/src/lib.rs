//! dync-core — shared domain types for the dyncd daemon.
//!
//! Holds what every other subsystem needs: the daemon configuration,
//! the server-version → artifact resolver, the per-request caller
//! context, and the container label scheme that identifies cluster
//! nodes in the runtime.

pub mod config;
pub mod context;
pub mod labels;
pub mod version;

pub use config::{ClusterConfig, DaemonConfig, DnsConfig, DockerConfig};
pub use context::RequestContext;
pub use version::{NodeVersion, VersionError};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
