use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use grip_semver::SemVer;

use crate::error::Result;
use crate::repository::Repository;

/// The literal tag used for floating "latest from the default branch"
/// requirements.
pub const DEVELOPMENT_TAG: &str = "development";

/// A version tag: either a tagged release or the floating development branch.
///
/// Development tags never take part in semantic ordering; they only compare
/// equal to other development tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Floating head of the default branch
    Development,
    /// A tagged release, ordered by its numeric components
    Stable(SemVer),
}

impl Tag {
    /// Parse a tag string. `"development"` is the only non-semantic tag;
    /// everything else must parse as a version number.
    pub fn parse(tag: &str) -> Result<Self> {
        if tag == DEVELOPMENT_TAG {
            return Ok(Tag::Development);
        }
        Ok(Tag::Stable(SemVer::parse(tag)?))
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Tag::Development)
    }

    /// The parsed release version, if this is a tagged release.
    pub fn as_semver(&self) -> Option<&SemVer> {
        match self {
            Tag::Stable(v) => Some(v),
            Tag::Development => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tag::Development => DEVELOPMENT_TAG,
            Tag::Stable(v) => v.raw(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Tag::Development => 0u8.hash(state),
            Tag::Stable(v) => {
                1u8.hash(state);
                v.hash(state);
            }
        }
    }
}

/// A requirement or published release: a repository at a specific tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub repository: Repository,
    pub tag: Tag,
}

impl Version {
    pub fn new(repository: Repository, tag: Tag) -> Self {
        Self { repository, tag }
    }

    /// Parse a `(reference, tag)` pair as written in a manifest.
    pub fn parse(reference: &str, tag: &str) -> Result<Self> {
        Ok(Self {
            repository: Repository::parse(reference)?,
            tag: Tag::parse(tag)?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.tag)
    }
}

/// One immutable content snapshot: a version plus the content hash it
/// resolved to. This is the unit of deduplication everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commit {
    pub version: Version,
    pub hash: String,
}

impl Commit {
    pub fn new(version: Version, hash: impl Into<String>) -> Self {
        Self {
            version,
            hash: hash.into(),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, short_hash(&self.hash))
    }
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

/// The configuration a package declares for itself: its own direct
/// requirements and the namespaces it maps to source paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageConfig {
    /// Direct requirements, keyed by the reference string as written.
    /// Insertion order is preserved; the solver depends on it.
    pub packages: IndexMap<String, Version>,
    /// Namespace to source-path map, used to detect identity clashes with
    /// the root project.
    pub map: IndexMap<String, String>,
}

impl PackageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a requirement.
    pub fn require(&mut self, reference: &str, tag: &str) -> Result<&mut Self> {
        self.packages
            .insert(reference.to_string(), Version::parse(reference, tag)?);
        Ok(self)
    }

    /// Map a namespace to a source path.
    pub fn map_namespace(
        &mut self,
        namespace: impl Into<String>,
        path: impl Into<String>,
    ) -> &mut Self {
        self.map.insert(namespace.into(), path.into());
        self
    }
}

/// A fetched package: a commit plus the configuration it declares.
///
/// `root` and `checksum` are materialization state set after installation;
/// they ride along untouched through resolution.
#[derive(Debug, Clone)]
pub struct Package {
    pub commit: Commit,
    pub config: PackageConfig,
    pub root: Option<PathBuf>,
    pub checksum: Option<String>,
}

impl Package {
    pub fn new(commit: Commit, config: PackageConfig) -> Self {
        Self {
            commit,
            config,
            root: None,
            checksum: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.commit.version.repository
    }

    pub fn tag(&self) -> &Tag {
        &self.commit.version.tag
    }

    /// Whether this package declares a requirement on the given repository.
    pub fn declares(&self, identity: &str) -> Option<&Version> {
        self.config
            .packages
            .values()
            .find(|v| v.repository.identity() == identity)
    }
}

/// Packages are interchangeable exactly when their commits are equal.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.commit == other.commit
    }
}

impl Eq for Package {}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.commit)
    }
}

/// Serialized manifest shape shared by project manifests and package
/// configurations: `"packages"` maps references to tags, `"map"` maps
/// namespaces to paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub packages: IndexMap<String, String>,
    #[serde(default)]
    pub map: IndexMap<String, String>,
}

impl RawConfig {
    /// Parse the raw reference/tag strings into a typed configuration.
    pub fn into_config(self) -> Result<PackageConfig> {
        let mut config = PackageConfig::new();
        for (reference, tag) in &self.packages {
            config.require(reference, tag)?;
        }
        config.map = self.map;
        Ok(config)
    }
}
