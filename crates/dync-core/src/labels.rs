//! Container label scheme.
//!
//! These four label keys are the only identification attached to a node
//! container, and the reconciler rebuilds the whole cluster view from
//! them. They are a wire format: changing a key orphans every container
//! created by earlier daemon versions.

/// Identity of the caller that allocated the node.
pub const LABEL_CREATOR: &str = "com.couchbase.dyncluster.creator";

/// Cluster the node belongs to.
pub const LABEL_CLUSTER_ID: &str = "com.couchbase.dyncluster.cluster_id";

/// Node name within its cluster.
pub const LABEL_NODE_NAME: &str = "com.couchbase.dyncluster.node_name";

/// Server version requested at allocation time.
pub const LABEL_INITIAL_SERVER_VERSION: &str = "com.couchbase.dyncluster.initial_server_version";

/// Bind mount sharing the host clock with the node, same effect as ntp.
pub const LOCALTIME_BIND: &str = "/etc/localtime:/etc/localtime";

/// Deterministic container name for a node.
pub fn container_name(cluster_id: &str, node_name: &str) -> String {
    format!("dynclsr-{cluster_id}-{node_name}")
}
