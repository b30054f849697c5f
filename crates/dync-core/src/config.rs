//! dyncd.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level daemon configuration.
///
/// Every section has defaults so a partial (or absent) config file is
/// usable; the daemon binary applies CLI flag overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Port the REST API listens on.
    pub listen_port: u16,
    /// Directory for persistent state (cluster metadata database).
    pub data_dir: PathBuf,
    pub docker: DockerConfig,
    pub cluster: ClusterConfig,
    /// DNS registration endpoint. When absent, nodes are not registered
    /// and containers get no explicit DNS server.
    pub dns: Option<DnsConfig>,
}

/// Container runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Engine endpoint: `unix:///path/to/docker.sock` or `tcp://host:port`.
    pub endpoint: String,
    /// Registry prefix for node images.
    pub registry: String,
    /// Pre-existing network every node container attaches to.
    pub network: String,
}

/// Cluster lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Initial expiry window granted at allocation time, in seconds.
    /// Callers extend it afterwards through the refresh operation.
    pub default_window_secs: u64,
}

/// DNS registrar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Registrar host; also handed to node containers as their DNS server.
    pub host: String,
    #[serde(default = "default_dns_port")]
    pub port: u16,
    /// Domain the registrar manages; node hostnames are suffixed with it.
    #[serde(default = "default_dns_domain")]
    pub domain: String,
}

fn default_dns_port() -> u16 {
    80
}

fn default_dns_domain() -> String {
    "couchbase.com".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen_port: 19923,
            data_dir: PathBuf::from("/var/lib/dyncd"),
            docker: DockerConfig::default(),
            cluster: ClusterConfig::default(),
            dns: None,
        }
    }
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            endpoint: "unix:///var/run/docker.sock".to_string(),
            registry: "dockerhub.build.couchbase.com".to_string(),
            network: "macvlan0".to_string(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            default_window_secs: 60 * 60,
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = DaemonConfig::default();
        assert_eq!(config.listen_port, 19923);
        assert_eq!(config.docker.network, "macvlan0");
        assert!(config.dns.is_none());
        assert_eq!(config.cluster.default_window_secs, 3600);
    }

    #[test]
    fn parse_partial_file() {
        let toml_str = r#"
listen_port = 9090

[docker]
registry = "registry.example.com"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.listen_port, 9090);
        assert_eq!(config.docker.registry, "registry.example.com");
        // Untouched sections keep their defaults.
        assert_eq!(config.docker.network, "macvlan0");
        assert_eq!(config.cluster.default_window_secs, 3600);
    }

    #[test]
    fn parse_dns_section() {
        let toml_str = r#"
[dns]
host = "10.1.2.3"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        let dns = config.dns.unwrap();
        assert_eq!(dns.host, "10.1.2.3");
        assert_eq!(dns.port, 80);
        assert_eq!(dns.domain, "couchbase.com");
    }
}
