//! dync-runtime — the container runtime seam.
//!
//! The daemon drives node containers exclusively through the
//! [`ContainerRuntime`] trait: create, start, inspect, stop (configured
//! to auto-remove) and list. The production adapter lives in
//! `dync-docker`; [`memory::MemoryRuntime`] is the in-process
//! implementation used by orchestrator and API tests.

pub mod error;
pub mod memory;
pub mod types;

pub use error::{RuntimeError, RuntimeResult};
pub use types::{ContainerInfo, ContainerSpec, NetworkAttachment};

use async_trait::async_trait;

/// Container runtime collaborator contract.
///
/// Implementations resolve abbreviated container ids the way the engine
/// does: any unique id prefix addresses the container.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a container. Labels must be attached atomically with
    /// creation; they are the only identification the reconciler has.
    async fn create(&self, spec: &ContainerSpec) -> RuntimeResult<String>;

    /// Start a created container. Starting an already-running container
    /// is a no-op.
    async fn start(&self, id: &str) -> RuntimeResult<()>;

    /// Inspect a container, including its per-network addresses.
    async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInfo>;

    /// Stop a container. Containers created with `auto_remove` disappear
    /// once stopped; stopping an already-stopped container is a no-op.
    async fn stop(&self, id: &str) -> RuntimeResult<()>;

    /// List every container, running or not.
    async fn list_all(&self) -> RuntimeResult<Vec<ContainerInfo>>;
}
