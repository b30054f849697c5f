//! Request options and the reconciled cluster view.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use dync_core::NodeVersion;

/// Caller-supplied options for one node of a new cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeOptions {
    /// Node name; defaults to `node_<index+1>` when empty.
    pub name: Option<String>,
    pub platform: Option<String>,
    /// Requested server version string, e.g. `6.5.1-2134`.
    pub server_version: String,
}

/// Caller-supplied options for a new cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Requested lifetime. Validated against the allowed bounds; the
    /// initially stored expiry uses the configured default window and
    /// is extended later via refresh.
    pub timeout: Duration,
    pub nodes: Vec<NodeOptions>,
}

/// A node spec after validation: named, version resolved.
#[derive(Debug, Clone)]
pub(crate) struct NodeSpec {
    pub name: String,
    pub server_version: String,
    pub version: NodeVersion,
}

/// One node of a reconciled cluster.
///
/// Derived entirely from runtime state and creation-time labels; never
/// stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Abbreviated container id (12 chars), as the runtime addresses it.
    pub container_id: String,
    pub state: String,
    pub name: String,
    pub initial_server_version: String,
    pub ipv4_address: String,
    pub ipv6_address: String,
}

/// A reconciled cluster: runtime containers joined with metadata.
///
/// `owner`/`timeout` are `None` when the metadata record is missing —
/// the cluster still surfaces, so a lost record never hides containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// From the first container's creator label, `"unknown"` if absent.
    pub creator: String,
    pub owner: Option<String>,
    /// Expiry as Unix epoch seconds.
    pub timeout: Option<u64>,
    pub nodes: Vec<Node>,
}
