use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::package::{RawConfig, Version};

/// The root project's manifest (`grip.json`).
///
/// `packages` declares the project's direct requirements as
/// reference-to-tag pairs; `map` declares the namespaces the project itself
/// owns, used to detect packages that would collide with the project's own
/// identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub packages: IndexMap<String, String>,
    #[serde(default)]
    pub map: IndexMap<String, String>,
}

impl ProjectManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declare a requirement. Panics only on programmer error in tests;
    /// invalid references surface as errors.
    pub fn require(&mut self, reference: &str, tag: &str) -> &mut Self {
        self.packages.insert(reference.to_string(), tag.to_string());
        self
    }

    /// Map a namespace owned by the project itself.
    pub fn map_namespace(
        &mut self,
        namespace: impl Into<String>,
        path: impl Into<String>,
    ) -> &mut Self {
        self.map.insert(namespace.into(), path.into());
        self
    }

    /// The declared requirements as typed versions, keyed by repository
    /// identity, preserving declaration order.
    ///
    /// Two references naming the same repository collapse to one entry; the
    /// later declaration wins, matching plain map semantics.
    pub fn requirements(&self) -> Result<IndexMap<String, Version>> {
        let mut requirements = IndexMap::new();
        for (reference, tag) in &self.packages {
            let version = Version::parse(reference, tag)?;
            requirements.insert(version.repository.identity(), version);
        }
        Ok(requirements)
    }

    /// The manifest reinterpreted as a package configuration, for code paths
    /// that treat the project like any other dependency declarer.
    pub fn as_raw_config(&self) -> RawConfig {
        RawConfig {
            packages: self.packages.clone(),
            map: self.map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let manifest = ProjectManifest::from_json(
            r#"{
                "packages": {
                    "acme/widgets": "v1.0.0",
                    "https://github.com/acme/util.git": "development"
                },
                "map": {"App": "src"}
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.packages.len(), 2);
        assert_eq!(manifest.map.len(), 1);
    }

    #[test]
    fn test_from_json_defaults() {
        let manifest = ProjectManifest::from_json("{}").unwrap();
        assert!(manifest.packages.is_empty());
        assert!(manifest.map.is_empty());
    }

    #[test]
    fn test_requirements_typed_and_ordered() {
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/b", "v1.0.0");
        manifest.require("acme/a", "v2.0.0");

        let requirements = manifest.requirements().unwrap();
        let identities: Vec<&String> = requirements.keys().collect();
        assert_eq!(identities, vec!["github.com/acme/b", "github.com/acme/a"]);
    }

    #[test]
    fn test_requirements_rejects_bad_tag() {
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "not-a-version");
        assert!(manifest.requirements().is_err());
    }

    #[test]
    fn test_requirements_collapse_same_repository() {
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "v1.0.0");
        manifest.require("https://github.com/acme/a", "v2.0.0");

        let requirements = manifest.requirements().unwrap();
        assert_eq!(requirements.len(), 1);
        assert_eq!(
            requirements["github.com/acme/a"].tag.as_str(),
            "v2.0.0"
        );
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grip.json");
        std::fs::write(&path, r#"{"packages": {"acme/a": "v1.0.0"}}"#).unwrap();

        let manifest = ProjectManifest::from_path(&path).unwrap();
        assert_eq!(manifest.packages.len(), 1);
    }
}
