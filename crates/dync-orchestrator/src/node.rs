//! Node allocation and teardown.
//!
//! One node is one container. Allocation creates, starts and inspects
//! the container, then best-effort registers its addresses; teardown is
//! a single stop (the container is created with auto-remove).

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use dync_core::labels::{
    container_name, LABEL_CLUSTER_ID, LABEL_CREATOR, LABEL_INITIAL_SERVER_VERSION,
    LABEL_NODE_NAME, LOCALTIME_BIND,
};
use dync_core::RequestContext;
use dync_runtime::{ContainerSpec, RuntimeError};

use crate::error::ClusterResult;
use crate::types::NodeSpec;
use crate::Orchestrator;

impl Orchestrator {
    /// Allocate one node into `cluster_id`.
    ///
    /// On success the container is running and labeled for discovery.
    /// On failure after creation, the container is left behind for the
    /// caller's rollback — the allocator never cleans up after itself,
    /// so a torn-down cluster accounts for every creation attempt.
    pub(crate) async fn allocate_node(
        &self,
        ctx: &RequestContext,
        cluster_id: &str,
        timeout: u64,
        spec: &NodeSpec,
    ) -> ClusterResult<String> {
        info!(
            cluster = %cluster_id,
            node = %spec.name,
            version = %spec.server_version,
            timeout,
            user = %ctx.user,
            "allocating node"
        );

        let name = container_name(cluster_id, &spec.name);
        let image = spec.version.image_name(&self.config.docker.registry);

        let mut labels = BTreeMap::new();
        labels.insert(LABEL_CREATOR.to_string(), ctx.user.clone());
        labels.insert(LABEL_CLUSTER_ID.to_string(), cluster_id.to_string());
        labels.insert(LABEL_NODE_NAME.to_string(), spec.name.clone());
        labels.insert(
            LABEL_INITIAL_SERVER_VERSION.to_string(),
            spec.server_version.clone(),
        );

        let dns_servers = match &self.config.dns {
            Some(dns) => vec![dns.host.clone()],
            None => Vec::new(),
        };

        let container = ContainerSpec {
            name: name.clone(),
            image,
            labels,
            binds: vec![LOCALTIME_BIND.to_string()],
            network: self.config.docker.network.clone(),
            dns: dns_servers,
            auto_remove: true,
        };

        let id = self.runtime.create(&container).await?;
        self.runtime.start(&id).await?;

        let info = self.runtime.inspect(&id).await?;
        let attachment = info
            .networks
            .get(&self.config.docker.network)
            .cloned()
            .unwrap_or_default();

        if let Some(dns) = &self.dns {
            let hostname = format!("{}.{}", name, dns.domain());
            for ip in [&attachment.ipv4, &attachment.ipv6] {
                if ip.is_empty() {
                    continue;
                }
                // Registration is an optimization, never a failure.
                match dns.register(&hostname, ip).await {
                    Ok(()) => debug!(%hostname, %ip, "node address registered"),
                    Err(e) => warn!(%hostname, %ip, error = %e, "node address registration failed"),
                }
            }
        }

        Ok(id)
    }

    /// Stop one node's container.
    ///
    /// Stop auto-removes the container, so there is no separate kill
    /// step; a container that is already gone counts as success, which
    /// keeps cleanup paths idempotent.
    pub(crate) async fn kill_node(&self, ctx: &RequestContext, container_id: &str) -> ClusterResult<()> {
        info!(container = %container_id, user = %ctx.user, "killing node");

        match self.runtime.stop(container_id).await {
            Ok(()) => Ok(()),
            Err(RuntimeError::NotFound(_)) => {
                debug!(container = %container_id, "container already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
