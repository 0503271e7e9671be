use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::package::{Commit, PackageConfig, Tag, Version};
use crate::repository::Repository;

use super::{SourceHost, SourceHostError};

/// An in-memory source host.
///
/// Backs the solver tests and the CLI's registry-snapshot mode. Commit
/// hashes are derived deterministically from the repository identity, the
/// tag and a per-tag revision counter, so re-publishing a tag produces a new
/// hash the same way a force-pushed tag would.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    entries: HashMap<String, HashMap<String, StoredPackage>>,
}

#[derive(Debug)]
struct StoredPackage {
    hash: String,
    config: PackageConfig,
    revision: u32,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a package at `reference@tag` with the given configuration.
    ///
    /// Publishing the same tag again replaces the stored package and bumps
    /// its content hash.
    ///
    /// # Panics
    ///
    /// Panics on an unparsable reference or tag; this is a test fixture.
    pub fn publish(&mut self, reference: &str, tag: &str, config: PackageConfig) -> &mut Self {
        let version = Version::parse(reference, tag).expect("valid reference and tag");
        let identity = version.repository.identity();

        let tags = self.entries.entry(identity.clone()).or_default();
        let revision = tags
            .get(version.tag.as_str())
            .map(|stored| stored.revision + 1)
            .unwrap_or(0);
        let hash = content_hash(&identity, version.tag.as_str(), revision);

        tags.insert(
            version.tag.as_str().to_string(),
            StoredPackage {
                hash,
                config,
                revision,
            },
        );
        self
    }

    /// Publish a package with no requirements of its own.
    pub fn publish_leaf(&mut self, reference: &str, tag: &str) -> &mut Self {
        self.publish(reference, tag, PackageConfig::new())
    }

    /// Publish a package that requires the given `(reference, tag)` pairs.
    pub fn publish_with_requires(
        &mut self,
        reference: &str,
        tag: &str,
        requires: &[(&str, &str)],
    ) -> &mut Self {
        let mut config = PackageConfig::new();
        for (dep_reference, dep_tag) in requires {
            config
                .require(dep_reference, dep_tag)
                .expect("valid requirement");
        }
        self.publish(reference, tag, config)
    }

    /// Number of published `(repository, tag)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn stored(&self, repository: &Repository, tag: &Tag) -> Option<&StoredPackage> {
        self.entries
            .get(&repository.identity())?
            .get(tag.as_str())
    }
}

impl SourceHost for InMemoryHost {
    fn resolve_commit(
        &self,
        repository: &Repository,
        tag: &Tag,
    ) -> Result<Commit, SourceHostError> {
        let stored = self
            .stored(repository, tag)
            .ok_or(SourceHostError::TagNotFound)?;
        Ok(Commit::new(
            Version::new(repository.clone(), tag.clone()),
            stored.hash.clone(),
        ))
    }

    fn fetch_config(&self, commit: &Commit) -> Result<PackageConfig, SourceHostError> {
        let stored = self
            .stored(&commit.version.repository, &commit.version.tag)
            .filter(|stored| stored.hash == commit.hash)
            .ok_or_else(|| SourceHostError::CommitNotFound {
                hash: commit.hash.clone(),
            })?;
        Ok(stored.config.clone())
    }
}

fn content_hash(identity: &str, tag: &str, revision: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b"@");
    hasher.update(tag.as_bytes());
    hasher.update(revision.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
