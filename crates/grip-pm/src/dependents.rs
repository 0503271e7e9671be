//! Inverse dependency analysis over a resolved package set: who needs a
//! given repository, and who needs them, up to the root requirements.

use std::collections::HashSet;
use std::sync::Arc;

use crate::package::Package;

/// One dependant of a repository, with its own dependants nested beneath.
#[derive(Debug, Clone)]
pub struct Dependent {
    pub package: Arc<Package>,
    /// The tag the dependant declared for the target
    pub declared_tag: String,
    pub children: Vec<Dependent>,
}

/// Find every package in `packages` that declares a requirement on the
/// repository named by `identity`, recursing into each dependant's own
/// dependants. Cycles are cut at the first repeated repository.
pub fn dependents_of(packages: &[Arc<Package>], identity: &str) -> Vec<Dependent> {
    let mut seen = HashSet::new();
    seen.insert(identity.to_string());
    collect(packages, identity, &mut seen)
}

fn collect(
    packages: &[Arc<Package>],
    identity: &str,
    seen: &mut HashSet<String>,
) -> Vec<Dependent> {
    let mut results = Vec::new();
    for package in packages {
        let Some(declared) = package.declares(identity) else {
            continue;
        };

        let dependant_identity = package.repository().identity();
        let children = if seen.insert(dependant_identity.clone()) {
            let children = collect(packages, &dependant_identity, seen);
            seen.remove(&dependant_identity);
            children
        } else {
            Vec::new()
        };

        results.push(Dependent {
            package: Arc::clone(package),
            declared_tag: declared.tag.as_str().to_string(),
            children,
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Commit, PackageConfig, Version};

    fn pkg(reference: &str, tag: &str, requires: &[(&str, &str)]) -> Arc<Package> {
        let version = Version::parse(reference, tag).unwrap();
        let commit = Commit::new(version, format!("hash-{reference}"));
        let mut config = PackageConfig::new();
        for (dep_reference, dep_tag) in requires {
            config.require(dep_reference, dep_tag).unwrap();
        }
        Arc::new(Package::new(commit, config))
    }

    #[test]
    fn test_direct_dependants() {
        let packages = vec![
            pkg("acme/a", "v1.0.0", &[("acme/c", "v1.0.0")]),
            pkg("acme/b", "v1.0.0", &[("acme/c", "v1.0.0")]),
            pkg("acme/c", "v1.0.0", &[]),
        ];

        let dependants = dependents_of(&packages, "github.com/acme/c");
        let names: Vec<String> = dependants
            .iter()
            .map(|d| d.package.repository().identity())
            .collect();
        assert_eq!(names, vec!["github.com/acme/a", "github.com/acme/b"]);
    }

    #[test]
    fn test_transitive_chain() {
        let packages = vec![
            pkg("acme/a", "v1.0.0", &[("acme/b", "v1.0.0")]),
            pkg("acme/b", "v1.0.0", &[("acme/c", "v1.0.0")]),
            pkg("acme/c", "v1.0.0", &[]),
        ];

        let dependants = dependents_of(&packages, "github.com/acme/c");
        assert_eq!(dependants.len(), 1);
        assert_eq!(dependants[0].package.repository().identity(), "github.com/acme/b");
        assert_eq!(dependants[0].children.len(), 1);
        assert_eq!(
            dependants[0].children[0].package.repository().identity(),
            "github.com/acme/a"
        );
    }

    #[test]
    fn test_cycle_is_cut() {
        let packages = vec![
            pkg("acme/a", "v1.0.0", &[("acme/b", "v1.0.0")]),
            pkg("acme/b", "v1.0.0", &[("acme/a", "v1.0.0")]),
        ];

        let dependants = dependents_of(&packages, "github.com/acme/a");
        assert_eq!(dependants.len(), 1);
        // b depends on a, a depends on b, and the walk stops there
        assert_eq!(dependants[0].children.len(), 1);
        assert!(dependants[0].children[0].children.is_empty());
    }

    #[test]
    fn test_no_dependants() {
        let packages = vec![pkg("acme/a", "v1.0.0", &[])];
        assert!(dependents_of(&packages, "github.com/acme/a").is_empty());
    }
}
