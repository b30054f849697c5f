//! dync-docker — Docker Engine adapter for the runtime contract.
//!
//! Speaks the engine's HTTP API directly over its unix socket (or a TCP
//! endpoint), one short-lived connection per call. Containers are
//! addressed by id or unique id prefix, exactly as the engine resolves
//! them, so the reconciled view's abbreviated ids work unchanged.

mod transport;
mod wire;

use async_trait::async_trait;
use tracing::debug;

use dync_runtime::{ContainerInfo, ContainerRuntime, ContainerSpec, RuntimeError, RuntimeResult};

use crate::transport::{Endpoint, HttpTransport};
use crate::wire::{ContainerInspect, ContainerSummary, CreateContainerBody, CreateContainerResponse};

/// [`ContainerRuntime`] implementation over the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    transport: HttpTransport,
}

impl DockerRuntime {
    /// Build a runtime client for `unix:///path` or `tcp://host:port`.
    /// Validates the endpoint only; no connection is made until the
    /// first call.
    pub fn connect(endpoint: &str) -> RuntimeResult<Self> {
        let endpoint = Endpoint::parse(endpoint)?;
        debug!(?endpoint, "docker runtime configured");
        Ok(Self {
            transport: HttpTransport::new(endpoint),
        })
    }

    fn api_error(status: http::StatusCode, body: &[u8], subject: &str) -> RuntimeError {
        if status == http::StatusCode::NOT_FOUND {
            return RuntimeError::NotFound(subject.to_string());
        }
        if status == http::StatusCode::CONFLICT {
            return RuntimeError::Conflict(subject.to_string());
        }
        let message = serde_json::from_slice::<wire::ErrorResponse>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
        RuntimeError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        let body = serde_json::to_vec(&CreateContainerBody::from_spec(spec))
            .map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        let path = format!("/containers/create?name={}", spec.name);
        let (status, resp) = self.transport.request("POST", &path, Some(body)).await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &resp, &spec.name));
        }
        let created: CreateContainerResponse =
            serde_json::from_slice(&resp).map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        debug!(container = %created.id, name = %spec.name, "container created");
        Ok(created.id)
    }

    async fn start(&self, id: &str) -> RuntimeResult<()> {
        let path = format!("/containers/{id}/start");
        let (status, resp) = self.transport.request("POST", &path, None).await?;
        // 304: already started.
        if status.is_success() || status == http::StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        Err(Self::api_error(status, &resp, id))
    }

    async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInfo> {
        let path = format!("/containers/{id}/json");
        let (status, resp) = self.transport.request("GET", &path, None).await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &resp, id));
        }
        let inspect: ContainerInspect =
            serde_json::from_slice(&resp).map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        Ok(inspect.into())
    }

    async fn stop(&self, id: &str) -> RuntimeResult<()> {
        let path = format!("/containers/{id}/stop");
        let (status, resp) = self.transport.request("POST", &path, None).await?;
        // 304: already stopped.
        if status.is_success() || status == http::StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        Err(Self::api_error(status, &resp, id))
    }

    async fn list_all(&self) -> RuntimeResult<Vec<ContainerInfo>> {
        let (status, resp) = self
            .transport
            .request("GET", "/containers/json?all=true", None)
            .await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &resp, "list"));
        }
        let summaries: Vec<ContainerSummary> =
            serde_json::from_slice(&resp).map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }
}
