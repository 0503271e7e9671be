//! Two-phase dependency resolution.
//!
//! Phase one enumerates every complete assignment of repositories to
//! values that satisfies the constraint families; phase two selects the
//! maximum-preference assignment. The orchestrator here ties the phases
//! together and classifies failures: a strict run that fails but would
//! succeed with relaxed major-version matching is reported as a version
//! incompatibility the user can opt out of, everything else as a plain
//! resolution failure.

pub mod csp;
mod domain;
mod sat;


use std::sync::Arc;

use crate::error::{ResolverError, Result};
use crate::graph::PackageGroups;
use crate::manifest::ProjectManifest;
use crate::package::Package;

pub use csp::{Assignment, ConstraintSolver};
pub use domain::DomainValue;
pub use sat::{Literal, Optimizer};

/// Resolve the manifest's requirements against a candidate set.
///
/// Returns one package per selected repository, sorted by repository
/// identity. When `ignore_version_compatibility` is set, dependants may
/// disagree on major versions and the highest line wins.
pub fn resolve(
    groups: &PackageGroups,
    manifest: &ProjectManifest,
    ignore_version_compatibility: bool,
) -> Result<Vec<Arc<Package>>> {
    let solutions =
        ConstraintSolver::new(groups, manifest, ignore_version_compatibility)?.solve()?;
    log::info!(
        "Found {} satisfying assignments over {} repositories",
        solutions.len(),
        groups.len()
    );

    if solutions.is_empty() {
        if !ignore_version_compatibility {
            // Distinguish "impossible" from "impossible unless majors are
            // allowed to diverge"; the relaxed probe gets its own solver so
            // no pinned state leaks between runs.
            let relaxed = ConstraintSolver::new(groups, manifest, true)?.solve()?;
            if !relaxed.is_empty() {
                return Err(ResolverError::VersionIncompatibility(
                    "requirements only agree when major version matching is relaxed".to_string(),
                ));
            }
        }
        return Err(ResolverError::DependencyResolution(
            "no assignment of versions satisfies every requirement".to_string(),
        ));
    }

    let requirements = manifest.requirements()?;
    let optimizer = Optimizer::build(solutions, &requirements, ignore_version_compatibility)?;
    let mut packages = optimizer.maximize()?;

    if requirements.len() > packages.len() {
        return Err(ResolverError::DependencyResolution(format!(
            "only {} of {} required packages could be resolved",
            packages.len(),
            requirements.len()
        )));
    }

    packages.sort_by_key(|p| p.repository().identity());
    Ok(packages)
}
