use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::package::RawConfig;

use super::InMemoryHost;

/// A serialized registry: every published `(repository, tag)` pair together
/// with the configuration it declares. The CLI resolves against one of
/// these instead of a live host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub packages: Vec<SnapshotPackage>,
}

/// One published package in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPackage {
    pub repository: String,
    pub tag: String,
    #[serde(flatten)]
    pub config: RawConfig,
}

impl RegistrySnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Materialize the snapshot as an in-memory host.
    ///
    /// Invalid references or tags in the snapshot are reported, not skipped.
    pub fn into_host(self) -> Result<InMemoryHost> {
        let mut host = InMemoryHost::new();
        for package in self.packages {
            let config = package.config.into_config()?;
            // Validate the published coordinates before storing them
            crate::package::Version::parse(&package.repository, &package.tag)?;
            host.publish(&package.repository, &package.tag, config);
        }
        Ok(host)
    }
}
