//! In-memory container runtime.
//!
//! Behaves like the real engine where the orchestrator can tell the
//! difference: ids are 64-hex and addressable by unique prefix, stopping
//! an `auto_remove` container removes it, and duplicate names conflict.
//! Tests inject create/start failures by container-name substring and
//! read back call counters.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RuntimeError, RuntimeResult};
use crate::types::{ContainerInfo, ContainerSpec, NetworkAttachment};
use crate::ContainerRuntime;

#[derive(Debug, Clone)]
struct MemoryContainer {
    id: String,
    spec: ContainerSpec,
    state: String,
    networks: HashMap<String, NetworkAttachment>,
}

#[derive(Default)]
struct Inner {
    /// Keyed by full container id; BTreeMap keeps listing order stable.
    containers: BTreeMap<String, MemoryContainer>,
    next_id: u64,
    create_calls: u32,
    start_calls: u32,
    stop_calls: u32,
    fail_create: Vec<String>,
    fail_start: Vec<String>,
}

/// In-process [`ContainerRuntime`] implementation.
#[derive(Default)]
pub struct MemoryRuntime {
    inner: Mutex<Inner>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any `create` whose container name contains `fragment`.
    pub fn fail_create_matching(&self, fragment: &str) {
        self.inner.lock().unwrap().fail_create.push(fragment.to_string());
    }

    /// Fail any `start` whose container name contains `fragment`.
    pub fn fail_start_matching(&self, fragment: &str) {
        self.inner.lock().unwrap().fail_start.push(fragment.to_string());
    }

    pub fn create_calls(&self) -> u32 {
        self.inner.lock().unwrap().create_calls
    }

    pub fn start_calls(&self) -> u32 {
        self.inner.lock().unwrap().start_calls
    }

    pub fn stop_calls(&self) -> u32 {
        self.inner.lock().unwrap().stop_calls
    }

    /// Names of all containers currently present.
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.containers.values().map(|c| c.spec.name.clone()).collect()
    }

    /// Drop network attachment data for a container, simulating a
    /// runtime that has not reported addresses yet.
    pub fn clear_networks(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        let full = resolve(&inner, id).expect("unknown container id");
        inner.containers.get_mut(&full).unwrap().networks.clear();
    }

    fn info(container: &MemoryContainer) -> ContainerInfo {
        ContainerInfo {
            id: container.id.clone(),
            state: container.state.clone(),
            labels: container.spec.labels.clone(),
            networks: container.networks.clone(),
        }
    }
}

/// Resolve an exact id or unique prefix to a full id.
fn resolve(inner: &Inner, id: &str) -> RuntimeResult<String> {
    if inner.containers.contains_key(id) {
        return Ok(id.to_string());
    }
    let mut matches = inner.containers.keys().filter(|k| k.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(full), None) => Ok(full.clone()),
        _ => Err(RuntimeError::NotFound(id.to_string())),
    }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
    async fn create(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;

        if inner.fail_create.iter().any(|f| spec.name.contains(f)) {
            return Err(RuntimeError::Api {
                status: 500,
                message: format!("injected create failure for {}", spec.name),
            });
        }
        if inner.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(RuntimeError::Conflict(spec.name.clone()));
        }

        inner.next_id += 1;
        let seq = inner.next_id;
        // Unique within the first 12 chars, like real engine ids, so
        // abbreviated-id addressing stays unambiguous.
        let id = format!("{seq:012x}{seq:052x}");

        let mut networks = HashMap::new();
        if !spec.network.is_empty() {
            networks.insert(
                spec.network.clone(),
                NetworkAttachment {
                    ipv4: format!("10.89.0.{}", 10 + seq),
                    ipv6: format!("fd00::{seq:x}"),
                },
            );
        }

        inner.containers.insert(
            id.clone(),
            MemoryContainer {
                id: id.clone(),
                spec: spec.clone(),
                state: "created".to_string(),
                networks,
            },
        );
        Ok(id)
    }

    async fn start(&self, id: &str) -> RuntimeResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.start_calls += 1;
        let full = resolve(&inner, id)?;
        let name = inner.containers[&full].spec.name.clone();
        if inner.fail_start.iter().any(|f| name.contains(f)) {
            return Err(RuntimeError::Api {
                status: 500,
                message: format!("injected start failure for {name}"),
            });
        }
        inner.containers.get_mut(&full).unwrap().state = "running".to_string();
        Ok(())
    }

    async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInfo> {
        let inner = self.inner.lock().unwrap();
        let full = resolve(&inner, id)?;
        Ok(Self::info(&inner.containers[&full]))
    }

    async fn stop(&self, id: &str) -> RuntimeResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.stop_calls += 1;
        let full = resolve(&inner, id)?;
        if inner.containers[&full].spec.auto_remove {
            inner.containers.remove(&full);
        } else {
            inner.containers.get_mut(&full).unwrap().state = "exited".to_string();
        }
        Ok(())
    }

    async fn list_all(&self) -> RuntimeResult<Vec<ContainerInfo>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.containers.values().map(Self::info).collect())
    }
}
