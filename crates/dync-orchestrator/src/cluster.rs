//! Cluster reconciliation and lifecycle operations.
//!
//! The visible cluster set is recomputed on every read from the two
//! sources of truth — runtime containers and the metadata store — and
//! never cached. Multi-node operations fan out one task per node (or per
//! cluster) and always drain every task before deciding the outcome, so
//! no container creation or teardown goes unaccounted, at the cost of
//! waiting for the slowest worker.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use dync_core::labels::{LABEL_CLUSTER_ID, LABEL_CREATOR, LABEL_INITIAL_SERVER_VERSION, LABEL_NODE_NAME};
use dync_core::{epoch_secs, NodeVersion, RequestContext};
use dync_runtime::ContainerInfo;
use dync_store::ClusterMeta;

use crate::error::{ClusterError, ClusterResult};
use crate::types::{Cluster, ClusterOptions, Node, NodeSpec};
use crate::Orchestrator;

/// Upper bound on nodes per cluster.
pub const MAX_CLUSTER_NODES: usize = 10;

/// Upper bound on a requested cluster lifetime.
pub const MAX_CLUSTER_TIMEOUT: Duration = Duration::from_secs(2 * 7 * 24 * 60 * 60);

/// Short random cluster identifier. Collisions are negligible at the
/// scale of concurrently live test clusters.
fn new_cluster_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Abbreviate a container id the way the runtime displays it.
fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

impl Orchestrator {
    // ── Reconciliation ─────────────────────────────────────────────

    /// Rebuild the caller-visible cluster set from live containers
    /// joined with stored metadata.
    pub async fn get_all_clusters(&self, ctx: &RequestContext) -> ClusterResult<Vec<Cluster>> {
        let containers = self.runtime.list_all().await?;

        let mut groups: BTreeMap<String, Vec<ContainerInfo>> = BTreeMap::new();
        for container in containers {
            // Containers without a cluster label are not ours.
            let Some(cluster_id) = container.labels.get(LABEL_CLUSTER_ID) else {
                continue;
            };
            if cluster_id.is_empty() {
                continue;
            }
            groups.entry(cluster_id.clone()).or_default().push(container);
        }

        let mut clusters = Vec::new();
        for (cluster_id, members) in groups {
            // A missing or unreadable record must never hide a cluster.
            let meta = match self.store.get(&cluster_id) {
                Ok(Some(meta)) => Some(meta),
                Ok(None) => {
                    warn!(cluster = %cluster_id, "encountered unregistered cluster");
                    None
                }
                Err(e) => {
                    warn!(cluster = %cluster_id, error = %e, "failed to read cluster metadata");
                    None
                }
            };

            let mut creator = String::new();
            let mut nodes = Vec::new();
            for container in &members {
                // A container the runtime has not reported addresses for
                // still shows up, just with empty address fields.
                let attachment = container
                    .networks
                    .get(&self.config.docker.network)
                    .cloned()
                    .unwrap_or_default();

                if creator.is_empty() {
                    if let Some(label) = container.labels.get(LABEL_CREATOR) {
                        creator = label.clone();
                    }
                }

                nodes.push(Node {
                    container_id: short_id(&container.id),
                    state: container.state.clone(),
                    name: container
                        .labels
                        .get(LABEL_NODE_NAME)
                        .cloned()
                        .unwrap_or_default(),
                    initial_server_version: container
                        .labels
                        .get(LABEL_INITIAL_SERVER_VERSION)
                        .cloned()
                        .unwrap_or_default(),
                    ipv4_address: attachment.ipv4,
                    ipv6_address: attachment.ipv6,
                });
            }

            if creator.is_empty() {
                creator = "unknown".to_string();
            }

            // Don't include clusters the caller doesn't own.
            if !ctx.ignore_ownership && creator != ctx.user {
                continue;
            }

            clusters.push(Cluster {
                id: cluster_id,
                creator,
                owner: meta.as_ref().map(|m| m.owner.clone()),
                timeout: meta.map(|m| m.timeout),
                nodes,
            });
        }

        Ok(clusters)
    }

    /// One cluster out of the reconciled set.
    pub async fn get_cluster(&self, ctx: &RequestContext, cluster_id: &str) -> ClusterResult<Cluster> {
        self.get_all_clusters(ctx)
            .await?
            .into_iter()
            .find(|cluster| cluster.id == cluster_id)
            .ok_or_else(|| ClusterError::NotFound(cluster_id.to_string()))
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Allocate a new cluster; returns its id.
    ///
    /// All validation (bounds and version resolution) happens before any
    /// side effect. Node allocations run concurrently; if any fails, the
    /// whole cluster is torn down and the first error is returned — no
    /// partial cluster is left addressable.
    pub async fn allocate_cluster(
        &self,
        ctx: &RequestContext,
        opts: ClusterOptions,
    ) -> ClusterResult<String> {
        info!(user = %ctx.user, nodes = opts.nodes.len(), "allocating cluster");

        if opts.timeout.is_zero() {
            return Err(ClusterError::InvalidRequest(
                "must specify a valid timeout for the cluster".to_string(),
            ));
        }
        if opts.timeout > MAX_CLUSTER_TIMEOUT {
            return Err(ClusterError::InvalidRequest(
                "cannot allocate clusters for longer than 2 weeks".to_string(),
            ));
        }
        if opts.nodes.is_empty() {
            return Err(ClusterError::InvalidRequest(
                "must specify at least a single node for the cluster".to_string(),
            ));
        }
        if opts.nodes.len() > MAX_CLUSTER_NODES {
            return Err(ClusterError::InvalidRequest(
                "cannot allocate clusters with more than 10 nodes".to_string(),
            ));
        }

        let mut specs = Vec::with_capacity(opts.nodes.len());
        for (idx, node) in opts.nodes.iter().enumerate() {
            let version = NodeVersion::parse(&node.server_version)?;
            let name = match &node.name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => format!("node_{}", idx + 1),
            };
            specs.push(NodeSpec {
                name,
                server_version: node.server_version.clone(),
                version,
            });
        }

        let cluster_id = new_cluster_id();
        // The stored expiry is the configured default window, not the
        // requested timeout; the requested value only gates validation.
        let timeout_time = epoch_secs() + self.config.cluster.default_window_secs;

        self.store.create(
            &cluster_id,
            &ClusterMeta {
                owner: ctx.user.clone(),
                timeout: timeout_time,
            },
        )?;

        let mut tasks = JoinSet::new();
        for spec in specs {
            let this = self.clone();
            let ctx = ctx.clone();
            let cluster_id = cluster_id.clone();
            tasks.spawn(async move {
                this.allocate_node(&ctx, &cluster_id, timeout_time, &spec).await
            });
        }

        // Drain every worker before deciding the outcome, so every
        // created container is accounted for by the rollback below.
        let create_error = drain_first_error(&mut tasks).await;

        if let Some(err) = create_error {
            warn!(cluster = %cluster_id, error = %err, "node allocation failed, tearing cluster down");
            if let Err(kill_err) = self.kill_cluster(ctx, &cluster_id).await {
                warn!(cluster = %cluster_id, error = %kill_err, "compensating teardown incomplete");
            }
            return Err(err);
        }

        Ok(cluster_id)
    }

    /// Tear down a cluster: stop every node concurrently.
    ///
    /// All stops are attempted even when one fails; the first error is
    /// reported. There is no rollback for a failed teardown.
    pub async fn kill_cluster(&self, ctx: &RequestContext, cluster_id: &str) -> ClusterResult<()> {
        info!(cluster = %cluster_id, user = %ctx.user, "killing cluster");

        let cluster = self.get_cluster(ctx, cluster_id).await?;

        if !ctx.ignore_ownership && cluster.owner.as_deref() != Some(ctx.user.as_str()) {
            return Err(ClusterError::Forbidden);
        }

        let mut tasks = JoinSet::new();
        for node in &cluster.nodes {
            let this = self.clone();
            let ctx = ctx.clone();
            let container_id = node.container_id.clone();
            tasks.spawn(async move { this.kill_node(&ctx, &container_id).await });
        }

        match drain_first_error(&mut tasks).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Tear down every cluster visible to the caller.
    ///
    /// The ownership check still applies inside each nested kill.
    pub async fn kill_all_clusters(&self, ctx: &RequestContext) -> ClusterResult<()> {
        info!(user = %ctx.user, "killing all clusters");

        let clusters = self.get_all_clusters(ctx).await?;

        let mut tasks = JoinSet::new();
        for cluster in clusters {
            let this = self.clone();
            let ctx = ctx.clone();
            tasks.spawn(async move { this.kill_cluster(&ctx, &cluster.id).await });
        }

        match drain_first_error(&mut tasks).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Extend a cluster's expiry and take ownership of it.
    ///
    /// The stored timeout only ever moves forward: a refresh shorter
    /// than the remaining window leaves the window unchanged. A missing
    /// metadata record is recreated instead of updated.
    pub async fn refresh_cluster(
        &self,
        ctx: &RequestContext,
        cluster_id: &str,
        new_timeout: Duration,
    ) -> ClusterResult<()> {
        info!(cluster = %cluster_id, user = %ctx.user, "refreshing cluster");

        self.get_cluster(ctx, cluster_id).await?;

        let new_meta = ClusterMeta {
            owner: ctx.user.clone(),
            timeout: epoch_secs() + new_timeout.as_secs(),
        };

        match self.store.get(cluster_id) {
            Ok(Some(_)) => {}
            _ => {
                // The record went missing; insert a fresh one instead.
                return Ok(self.store.create(cluster_id, &new_meta)?);
            }
        }

        self.store.update(cluster_id, &|mut meta| {
            meta.owner = new_meta.owner.clone();
            if meta.timeout < new_meta.timeout {
                meta.timeout = new_meta.timeout;
            }
            meta
        })?;

        Ok(())
    }
}

/// Await every task in the set, returning the first error seen.
///
/// Never returns early: each worker runs to completion even after
/// another worker's failure has been observed.
async fn drain_first_error<T: Send + 'static>(
    tasks: &mut JoinSet<ClusterResult<T>>,
) -> Option<ClusterError> {
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(ClusterError::Task(e.to_string())));
        if let Err(err) = result {
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }
    first_error
}
