//! Cluster metadata record and store contract.

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Persisted per-cluster ownership and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMeta {
    /// Identity of the current owner. Refreshing transfers ownership to
    /// the refreshing caller.
    pub owner: String,
    /// Expiry as Unix epoch seconds. The sweep that reclaims expired
    /// clusters lives outside this daemon; this is the value it reads.
    pub timeout: u64,
}

/// Metadata store collaborator contract.
pub trait MetaStore: Send + Sync {
    /// Insert the record for a new cluster. Fails with
    /// [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// if the cluster already has one.
    fn create(&self, cluster_id: &str, meta: &ClusterMeta) -> StoreResult<()>;

    /// Read a cluster's record, `None` if absent.
    fn get(&self, cluster_id: &str) -> StoreResult<Option<ClusterMeta>>;

    /// Atomic read-modify-write of an existing record. The closure runs
    /// under the store's write isolation; concurrent updates never lose
    /// writes. Returns the stored result.
    fn update(
        &self,
        cluster_id: &str,
        apply: &dyn Fn(ClusterMeta) -> ClusterMeta,
    ) -> StoreResult<ClusterMeta>;
}
