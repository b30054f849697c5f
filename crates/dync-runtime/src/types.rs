//! Runtime-agnostic container types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Addresses a container holds on one network.
///
/// Fields are empty strings while unassigned, mirroring what engines
/// report for a container that has not finished attaching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    pub ipv4: String,
    pub ipv6: String,
}

/// Everything needed to create one node container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    /// Host bind mounts, `host:container` form.
    pub binds: Vec<String>,
    /// Network the container attaches to.
    pub network: String,
    /// Explicit DNS servers, empty for engine defaults.
    pub dns: Vec<String>,
    /// Remove the container as soon as it stops.
    pub auto_remove: bool,
}

/// A container as reported by the runtime (list or inspect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    /// Engine state string: `created`, `running`, `exited`, ...
    pub state: String,
    pub labels: BTreeMap<String, String>,
    /// Per-network address attachments, keyed by network name.
    pub networks: HashMap<String, NetworkAttachment>,
}
