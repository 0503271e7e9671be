//! Builds the candidate set the solver works over: every package reachable
//! from the project's declared requirements, grouped per repository.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ResolverError, Result};
use crate::manifest::ProjectManifest;
use crate::package::{Package, Version};
use crate::repository::Repository;
use crate::source::SourceHost;

/// Candidate packages for one repository, in discovery order.
#[derive(Debug, Clone)]
pub struct RepoGroup {
    pub repository: Repository,
    pub packages: Vec<Arc<Package>>,
}

/// Every repository referenced anywhere in the transitive graph, each with
/// its candidate packages deduplicated by commit.
///
/// Group order and in-group package order are discovery order; the solver
/// and the optimizer rely on both for deterministic output.
#[derive(Debug, Clone, Default)]
pub struct PackageGroups {
    groups: IndexMap<String, RepoGroup>,
}

impl PackageGroups {
    /// Resolve the full transitive graph of the manifest's requirements
    /// through the given host.
    pub fn build(manifest: &ProjectManifest, host: &dyn SourceHost) -> Result<Self> {
        let mut builder = GraphBuilder {
            host,
            groups: IndexMap::new(),
            visited: HashSet::new(),
        };

        for version in manifest.requirements()?.values() {
            builder.resolve(version)?;
        }

        let groups = Self {
            groups: builder.groups,
        };
        log::info!(
            "Discovered {} candidate packages across {} repositories",
            groups.package_count(),
            groups.len()
        );
        Ok(groups)
    }

    /// Number of distinct repositories.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total candidate packages across all repositories.
    pub fn package_count(&self) -> usize {
        self.groups.values().map(|g| g.packages.len()).sum()
    }

    pub fn get(&self, identity: &str) -> Option<&RepoGroup> {
        self.groups.get(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RepoGroup)> {
        self.groups.iter()
    }

    /// All candidate packages in discovery order.
    pub fn all_packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.groups.values().flat_map(|g| g.packages.iter())
    }
}

struct GraphBuilder<'a> {
    host: &'a dyn SourceHost,
    groups: IndexMap<String, RepoGroup>,
    /// `(repository identity, tag)` pairs already resolved or currently
    /// being resolved; breaks requirement cycles.
    visited: HashSet<(String, String)>,
}

impl GraphBuilder<'_> {
    fn resolve(&mut self, version: &Version) -> Result<()> {
        let identity = version.repository.identity();
        let key = (identity.clone(), version.tag.as_str().to_string());
        if !self.visited.insert(key) {
            return Ok(());
        }

        let commit = self
            .host
            .resolve_commit(&version.repository, &version.tag)
            .map_err(|source| ResolverError::SourceHost {
                repository: identity.clone(),
                tag: version.tag.as_str().to_string(),
                source,
            })?;
        let config = self
            .host
            .fetch_config(&commit)
            .map_err(|source| ResolverError::SourceHost {
                repository: identity.clone(),
                tag: version.tag.as_str().to_string(),
                source,
            })?;

        let package = Arc::new(Package::new(commit, config));

        let group = self
            .groups
            .entry(identity)
            .or_insert_with(|| RepoGroup {
                repository: version.repository.clone(),
                packages: Vec::new(),
            });

        if group.packages.iter().any(|p| p.commit == package.commit) {
            // Identical commit reached via another path; its requirements
            // are already in the graph.
            return Ok(());
        }
        log::debug!("Discovered {}", package);
        group.packages.push(Arc::clone(&package));

        let requirements: Vec<Version> = package.config.packages.values().cloned().collect();
        for requirement in &requirements {
            self.resolve(requirement)?;
        }
        Ok(())
    }
}
