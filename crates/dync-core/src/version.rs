//! Server-version → artifact resolution.
//!
//! A requested version string like `6.5.1-2134` resolves to a
//! [`NodeVersion`]: the base version, the release flavor (codename of the
//! `major.minor` line) and an optional build number. Everything a node
//! allocation fetches or runs — image name, package name, download URL —
//! derives from that descriptor by pure string composition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for released versions (no build number).
pub const RELEASE_URL: &str = "http://latestbuilds.service.couchbase.com/builds/releases/";

/// Base URL for per-build artifacts, scoped by flavor.
pub const BUILD_URL: &str =
    "http://latestbuilds.service.couchbase.com/builds/latestbuilds/couchbase-server/";

/// Errors from version resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("could not parse major/minor from version {0:?}")]
    InvalidVersion(String),

    #[error("{major}.{minor} is not a recognised release flavor")]
    UnknownFlavor { major: u32, minor: u32 },
}

/// Resolved artifact descriptor for one server version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVersion {
    /// Base semantic version, e.g. `6.5.1`.
    pub version: String,
    /// Release flavor for the `major.minor` line, e.g. `mad-hatter`.
    pub flavor: String,
    /// Build number when the target is a specific build rather than a release.
    pub build: Option<String>,
}

/// Closed flavor table, keyed by major and minor-floored-to-0-or-5.
fn flavor_for(major: u32, minor: u32) -> Option<&'static str> {
    match (major, minor) {
        (4, 0) => Some("sherlock"),
        (4, 5) => Some("watson"),
        (5, 0) => Some("spock"),
        (5, 5) => Some("vulcan"),
        (6, 0) => Some("alice"),
        (6, 5) => Some("mad-hatter"),
        (7, 0) => Some("cheshire-cat"),
        _ => None,
    }
}

impl NodeVersion {
    /// Resolve a `<version>[-<build>]` string into a descriptor.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let mut parts = input.splitn(3, '-');
        let base = parts.next().unwrap_or_default();
        let build = parts.next().map(str::to_string);

        let invalid = || VersionError::InvalidVersion(input.to_string());
        let mut numbers = base.split('.');
        let major: u32 = numbers
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let minor: u32 = numbers
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;

        // Flavors span two minor buckets per major line.
        let bucket = if minor >= 5 { 5 } else { 0 };
        let flavor = flavor_for(major, bucket).ok_or(VersionError::UnknownFlavor {
            major,
            minor: bucket,
        })?;

        Ok(Self {
            version: base.to_string(),
            flavor: flavor.to_string(),
            build,
        })
    }

    /// Canonical image tag, e.g. `6.5.1-2134.centos7`.
    pub fn tag_name(&self) -> String {
        match &self.build {
            Some(build) => format!("{}-{}.centos7", self.version, build),
            None => format!("{}.centos7", self.version),
        }
    }

    /// Fully qualified node image name under the given registry.
    pub fn image_name(&self, registry: &str) -> String {
        format!("{}/dynclsr-couchbase_{}", registry, self.tag_name())
    }

    /// Server package file name for this version.
    pub fn package_name(&self) -> String {
        match &self.build {
            Some(build) => format!(
                "couchbase-server-enterprise-{}-{}-centos7.x86_64.rpm",
                self.version, build
            ),
            None => format!(
                "couchbase-server-enterprise-{}-centos7.x86_64.rpm",
                self.version
            ),
        }
    }

    /// Archive URL the node image fetches its package from.
    ///
    /// No build number means the target is a release; otherwise the
    /// per-build archive scoped by flavor.
    pub fn download_url(&self) -> String {
        match &self.build {
            Some(build) => format!("{}{}/{}", BUILD_URL, self.flavor, build),
            None => format!("{}{}", RELEASE_URL, self.version),
        }
    }
}
