//! dync-orchestrator — the cluster lifecycle core.
//!
//! Composes the runtime, metadata store and DNS collaborators into the
//! cluster operations: concurrent multi-node allocation with rollback on
//! partial failure, reconciliation of the visible cluster set from
//! runtime state plus metadata, teardown, and expiry refresh.
//!
//! All collaborators are injected at construction; nothing here holds
//! process-wide state, so every test builds its own [`Orchestrator`]
//! over in-memory collaborators.

pub mod cluster;
pub mod error;
mod node;
pub mod types;

pub use cluster::{MAX_CLUSTER_NODES, MAX_CLUSTER_TIMEOUT};
pub use error::{ClusterError, ClusterResult};
pub use types::{Cluster, ClusterOptions, Node, NodeOptions};

use std::sync::Arc;

use dync_core::DaemonConfig;
use dync_dns::DnsRegistrar;
use dync_runtime::ContainerRuntime;
use dync_store::MetaStore;

/// Cluster lifecycle orchestrator over injected collaborators.
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn MetaStore>,
    dns: Option<Arc<DnsRegistrar>>,
    config: Arc<DaemonConfig>,
}

impl Orchestrator {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn MetaStore>,
        dns: Option<Arc<DnsRegistrar>>,
        config: Arc<DaemonConfig>,
    ) -> Self {
        Self {
            runtime,
            store,
            dns,
            config,
        }
    }
}
