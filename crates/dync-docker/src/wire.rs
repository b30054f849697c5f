//! Engine API wire types.
//!
//! Only the fields this daemon reads or writes; everything else in the
//! engine's responses is ignored by serde.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use dync_runtime::{ContainerInfo, ContainerSpec, NetworkAttachment};

#[derive(Debug, Serialize)]
pub(crate) struct CreateContainerBody<'a> {
    #[serde(rename = "Image")]
    pub image: &'a str,
    #[serde(rename = "Labels")]
    pub labels: &'a BTreeMap<String, String>,
    #[serde(rename = "HostConfig")]
    pub host_config: HostConfig<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HostConfig<'a> {
    #[serde(rename = "AutoRemove")]
    pub auto_remove: bool,
    #[serde(rename = "NetworkMode")]
    pub network_mode: &'a str,
    #[serde(rename = "Binds", skip_serializing_if = "<[String]>::is_empty")]
    pub binds: &'a [String],
    #[serde(rename = "Dns", skip_serializing_if = "<[String]>::is_empty")]
    pub dns: &'a [String],
}

impl<'a> CreateContainerBody<'a> {
    pub(crate) fn from_spec(spec: &'a ContainerSpec) -> Self {
        Self {
            image: &spec.image,
            labels: &spec.labels,
            host_config: HostConfig {
                auto_remove: spec.auto_remove,
                network_mode: &spec.network,
                binds: &spec.binds,
                dns: &spec.dns,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateContainerResponse {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "GlobalIPv6Address", default)]
    pub global_ipv6_address: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NetworkSettings {
    #[serde(rename = "Networks", default)]
    pub networks: HashMap<String, EndpointSettings>,
}

/// One entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
pub(crate) struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Labels", default)]
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: NetworkSettings,
}

/// `GET /containers/{id}/json`.
#[derive(Debug, Deserialize)]
pub(crate) struct ContainerInspect {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "State", default)]
    pub state: InspectState,
    #[serde(rename = "Config", default)]
    pub config: InspectConfig,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InspectState {
    #[serde(rename = "Status", default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InspectConfig {
    #[serde(rename = "Labels", default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

fn attachments(settings: NetworkSettings) -> HashMap<String, NetworkAttachment> {
    settings
        .networks
        .into_iter()
        .map(|(name, ep)| {
            (
                name,
                NetworkAttachment {
                    ipv4: ep.ip_address,
                    ipv6: ep.global_ipv6_address,
                },
            )
        })
        .collect()
}

impl From<ContainerSummary> for ContainerInfo {
    fn from(summary: ContainerSummary) -> Self {
        ContainerInfo {
            id: summary.id,
            state: summary.state,
            labels: summary.labels,
            networks: attachments(summary.network_settings),
        }
    }
}

impl From<ContainerInspect> for ContainerInfo {
    fn from(inspect: ContainerInspect) -> Self {
        ContainerInfo {
            id: inspect.id,
            state: inspect.state.status,
            labels: inspect.config.labels,
            networks: attachments(inspect.network_settings),
        }
    }
}
