//! Picks the best concrete selection out of the enumerated assignments.
//!
//! Variables are concrete packages deduplicated by commit; clauses are
//! small disjunctions of signed 1-based indices (negative means "must be
//! false"). The score rewards newer tags on root-required repositories,
//! with development branches outranking every release.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ResolverError, Result};
use crate::package::{Package, Version};

use super::csp::Assignment;
use super::domain::DomainValue;

/// A signed 1-based variable index; negative means the variable must be
/// false for the clause to be satisfied by it.
pub type Literal = i32;

/// Flat score a development branch contributes, deliberately above any
/// plausible release score.
const DEVELOPMENT_WEIGHT: u64 = 999_999;

/// Node budget for the maximizing enumeration, shared defensively with the
/// search stage's philosophy: typed error instead of a hang.
const MAX_ENUMERATION_NODES: u64 = 1_000_000;

/// Candidate variables for one repository.
#[derive(Debug)]
struct Group {
    identity: String,
    root_required: bool,
    /// Indices into `Optimizer::variables`
    members: Vec<usize>,
}

/// The weighted-selection problem built from a set of valid assignments.
#[derive(Debug)]
pub struct Optimizer {
    variables: Vec<Arc<Package>>,
    groups: Vec<Group>,
    /// Whether each variable belongs to a root-required repository
    root_member: Vec<bool>,
    /// Implication clauses `[-a, b]`; exclusivity and root coverage are
    /// enforced structurally by the enumeration
    implications: Vec<(usize, usize)>,
}

impl Optimizer {
    /// Build the selection problem.
    ///
    /// Fails when one repository is wanted both as a development branch and
    /// as a tagged release, or (in strict mode) when its candidates span
    /// several major versions. In relaxed mode only the highest major line
    /// survives and assignments using the discarded commits are dropped.
    pub fn build(
        solutions: Vec<Assignment>,
        requirements: &IndexMap<String, Version>,
        relaxed: bool,
    ) -> Result<Self> {
        let mut solutions = solutions;

        let groups = collect_candidates(&solutions);
        for (identity, candidates) in &groups {
            if !candidates.development.is_empty() && !candidates.stable.is_empty() {
                return Err(ResolverError::MixedVersions {
                    repository: identity.clone(),
                });
            }
        }

        let discarded = discard_lower_majors(&groups, relaxed)?;
        if !discarded.is_empty() {
            let before = solutions.len();
            solutions.retain(|solution| {
                !solution.values().any(|value| {
                    value
                        .as_package()
                        .is_some_and(|p| discarded.contains(&p.commit.hash))
                })
            });
            log::info!(
                "Dropped {} of {} assignments during major-version arbitration",
                before - solutions.len(),
                before
            );
        }

        // Rebuild from the surviving assignments so variables only cover
        // selectable commits
        let groups = collect_candidates(&solutions);

        let mut variables: Vec<Arc<Package>> = Vec::new();
        let mut group_list = Vec::new();
        for (identity, candidates) in &groups {
            let mut members = Vec::new();
            for package in candidates.development.iter().chain(&candidates.stable) {
                members.push(variables.len());
                variables.push(Arc::clone(package));
            }
            group_list.push(Group {
                identity: identity.clone(),
                root_required: requirements.contains_key(identity),
                members,
            });
        }

        let mut root_member = vec![false; variables.len()];
        for group in &group_list {
            if group.root_required {
                for &member in &group.members {
                    root_member[member] = true;
                }
            }
        }

        let implications = agreement_implications(&solutions, &variables);
        log::debug!(
            "Built selection problem: {} variables, {} groups, {} implication clauses",
            variables.len(),
            group_list.len(),
            implications.len()
        );

        Ok(Self {
            variables,
            groups: group_list,
            root_member,
            implications,
        })
    }

    /// The problem as explicit clauses, for inspection and tests: mutual
    /// exclusion per repository, coverage of root-required repositories,
    /// then the implications.
    pub fn clauses(&self) -> Vec<Vec<Literal>> {
        let lit = |index: usize| -> Literal { index as Literal + 1 };
        let mut clauses = Vec::new();
        for group in &self.groups {
            for (i, &a) in group.members.iter().enumerate() {
                for &b in &group.members[i + 1..] {
                    clauses.push(vec![-lit(a), -lit(b)]);
                }
            }
            if group.root_required && !group.members.is_empty() {
                clauses.push(group.members.iter().map(|&m| lit(m)).collect());
            }
        }
        for &(a, b) in &self.implications {
            clauses.push(vec![-lit(a), lit(b)]);
        }
        clauses
    }

    /// Find the maximum-scoring satisfying selection.
    ///
    /// Returns the selected packages in repository discovery order, or an
    /// empty list when no selection satisfies the clauses.
    pub fn maximize(&self) -> Result<Vec<Arc<Package>>> {
        let mut search = MaxSearch {
            optimizer: self,
            selected: vec![false; self.variables.len()],
            best: None,
            visited: 0,
        };
        search.descend(0, &mut Vec::new())?;

        let Some((score, members)) = search.best else {
            let identities: Vec<&str> =
                self.groups.iter().map(|g| g.identity.as_str()).collect();
            log::debug!("No satisfying selection over {}", identities.join(", "));
            return Ok(Vec::new());
        };
        log::debug!(
            "Best selection scores {:?} with {} packages",
            score,
            members.len()
        );
        Ok(members
            .into_iter()
            .map(|index| Arc::clone(&self.variables[index]))
            .collect())
    }

    fn weight(&self, index: usize) -> u64 {
        let package = &self.variables[index];
        match package.tag().as_semver() {
            None => DEVELOPMENT_WEIGHT,
            Some(v) => v.major() * 10_000 + v.minor() * 100 + v.patch(),
        }
    }

    fn implications_hold(&self, selected: &[bool]) -> bool {
        self.implications
            .iter()
            .all(|&(a, b)| !selected[a] || selected[b])
    }

    /// Score of a complete selection: root-required packages carry the
    /// score; everything else rides along for feasibility and only breaks
    /// ties, so the newest compatible transitive versions win.
    fn score(&self, selection: &[usize]) -> (u64, u64) {
        let mut root_score = 0;
        let mut total_score = 0;
        for &index in selection {
            let weight = self.weight(index);
            total_score += weight;
            if self.root_member[index] {
                root_score += weight;
            }
        }
        (root_score, total_score)
    }
}

/// Depth-first enumeration over one choice per repository group.
struct MaxSearch<'a> {
    optimizer: &'a Optimizer,
    selected: Vec<bool>,
    best: Option<((u64, u64), Vec<usize>)>,
    visited: u64,
}

impl MaxSearch<'_> {
    fn descend(&mut self, group_index: usize, selection: &mut Vec<usize>) -> Result<()> {
        self.visited += 1;
        if self.visited > MAX_ENUMERATION_NODES {
            return Err(ResolverError::SearchExhausted {
                visited: self.visited,
            });
        }

        let Some(group) = self.optimizer.groups.get(group_index) else {
            if self.optimizer.implications_hold(&self.selected) {
                let score = self.optimizer.score(selection);
                let better = match &self.best {
                    None => true,
                    Some((best_score, _)) => score > *best_score,
                };
                if better {
                    self.best = Some((score, selection.clone()));
                }
            }
            return Ok(());
        };

        // A repository may stay unselected unless the project requires it
        if !group.root_required {
            self.descend(group_index + 1, selection)?;
        }

        for &member in &group.members {
            self.selected[member] = true;
            selection.push(member);
            self.descend(group_index + 1, selection)?;
            selection.pop();
            self.selected[member] = false;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Candidates {
    development: Vec<Arc<Package>>,
    stable: Vec<Arc<Package>>,
}

/// Group every concrete value across all assignments by repository,
/// deduplicated by commit, split into development and release candidates.
fn collect_candidates(solutions: &[Assignment]) -> IndexMap<String, Candidates> {
    let mut groups: IndexMap<String, Candidates> = IndexMap::new();
    let mut seen: HashSet<String> = HashSet::new();

    for solution in solutions {
        for (identity, value) in solution {
            let Some(package) = value.as_package() else {
                continue;
            };
            if !seen.insert(format!("{}#{}", identity, package.commit.hash)) {
                continue;
            }
            let candidates = groups.entry(identity.clone()).or_default();
            if package.tag().is_development() {
                candidates.development.push(Arc::clone(package));
            } else {
                candidates.stable.push(Arc::clone(package));
            }
        }
    }

    for candidates in groups.values_mut() {
        candidates.stable.sort_by(|a, b| {
            a.tag()
                .as_semver()
                .cmp(&b.tag().as_semver())
                .then_with(|| a.commit.hash.cmp(&b.commit.hash))
        });
    }
    groups
}

/// Detect repositories whose release candidates span several major lines.
/// Strict mode reports them; relaxed mode returns the commit hashes of
/// every candidate below the highest major so their assignments can be
/// dropped.
fn discard_lower_majors(
    groups: &IndexMap<String, Candidates>,
    relaxed: bool,
) -> Result<HashSet<String>> {
    let mut discarded = HashSet::new();
    for (identity, candidates) in groups {
        let mut majors: Vec<u64> = candidates
            .stable
            .iter()
            .filter_map(|p| p.tag().as_semver().map(|v| v.major()))
            .collect();
        majors.sort_unstable();
        majors.dedup();
        if majors.len() <= 1 {
            continue;
        }

        if !relaxed {
            let lines: Vec<String> = majors.iter().map(u64::to_string).collect();
            return Err(ResolverError::VersionIncompatibility(format!(
                "{} is required across incompatible major versions {}",
                identity,
                lines.join(", ")
            )));
        }

        let highest = *majors.last().unwrap_or(&0);
        log::info!(
            "Keeping only major version {} of {} (relaxed compatibility)",
            highest,
            identity
        );
        for package in &candidates.stable {
            if package.tag().as_semver().map(|v| v.major()) != Some(highest) {
                discarded.insert(package.commit.hash.clone());
            }
        }
    }
    Ok(discarded)
}

/// Implication `a → b` holds when every assignment selecting `a` also
/// selects `b` (and at least one does). This carries each assignment's
/// internal agreement into the selection problem without forbidding the
/// alternatives other assignments offer.
fn agreement_implications(
    solutions: &[Assignment],
    variables: &[Arc<Package>],
) -> Vec<(usize, usize)> {
    let occurrences: Vec<Vec<usize>> = variables
        .iter()
        .map(|package| {
            solutions
                .iter()
                .enumerate()
                .filter(|(_, solution)| {
                    solution
                        .values()
                        .any(|v| v.as_package().is_some_and(|p| p.commit == package.commit))
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    let mut implications = Vec::new();
    for a in 0..variables.len() {
        if occurrences[a].is_empty() {
            continue;
        }
        for b in 0..variables.len() {
            if a == b {
                continue;
            }
            let subset = occurrences[a]
                .iter()
                .all(|index| occurrences[b].contains(index));
            if subset {
                implications.push((a, b));
            }
        }
    }
    implications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PackageGroups;
    use crate::manifest::ProjectManifest;
    use crate::solver::csp::ConstraintSolver;
    use crate::source::InMemoryHost;

    fn enumerate(
        host: &InMemoryHost,
        manifest: &ProjectManifest,
        relaxed: bool,
    ) -> Vec<Assignment> {
        let groups = PackageGroups::build(manifest, host).unwrap();
        ConstraintSolver::new(&groups, manifest, relaxed)
            .unwrap()
            .solve()
            .unwrap()
    }

    fn selected_tags(packages: &[Arc<Package>]) -> Vec<(String, String)> {
        let mut tags: Vec<(String, String)> = packages
            .iter()
            .map(|p| (p.repository().identity(), p.tag().as_str().to_string()))
            .collect();
        tags.sort();
        tags
    }

    #[test]
    fn test_single_solution_selected_verbatim() {
        let mut host = InMemoryHost::new();
        host.publish_with_requires("acme/a", "v1.0.0", &[("acme/b", "v1.0.0")]);
        host.publish_leaf("acme/b", "v1.0.0");
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "v1.0.0");

        let solutions = enumerate(&host, &manifest, false);
        let requirements = manifest.requirements().unwrap();
        let optimizer = Optimizer::build(solutions, &requirements, false).unwrap();
        let packages = optimizer.maximize().unwrap();

        assert_eq!(
            selected_tags(&packages),
            vec![
                ("github.com/acme/a".to_string(), "v1.0.0".to_string()),
                ("github.com/acme/b".to_string(), "v1.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_mixed_development_and_stable_is_fatal() {
        let mut host = InMemoryHost::new();
        host.publish_with_requires("acme/a", "v1.0.0", &[("acme/x", "development")]);
        host.publish_with_requires("acme/b", "v1.0.0", &[("acme/x", "v1.0.0")]);
        host.publish_leaf("acme/x", "development");
        host.publish_leaf("acme/x", "v1.0.0");
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "v1.0.0");
        manifest.require("acme/b", "v1.0.0");

        let solutions = enumerate(&host, &manifest, false);
        assert!(!solutions.is_empty());
        let requirements = manifest.requirements().unwrap();

        for relaxed in [false, true] {
            let err = Optimizer::build(solutions.clone(), &requirements, relaxed).unwrap_err();
            assert!(matches!(err, ResolverError::MixedVersions { .. }));
        }
    }

    #[test]
    fn test_clause_shape() {
        let mut host = InMemoryHost::new();
        host.publish_leaf("acme/a", "v1.0.0");
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "v1.0.0");

        let solutions = enumerate(&host, &manifest, false);
        let requirements = manifest.requirements().unwrap();
        let optimizer = Optimizer::build(solutions, &requirements, false).unwrap();

        // one variable, required: a single unit clause
        assert_eq!(optimizer.clauses(), vec![vec![1]]);
    }

    fn synthetic(reference: &str, tag: &str, requires: &[(&str, &str)]) -> Arc<Package> {
        let version = Version::parse(reference, tag).unwrap();
        let commit = crate::package::Commit::new(version, format!("hash-{reference}-{tag}"));
        let mut config = crate::package::PackageConfig::new();
        for (dep_reference, dep_tag) in requires {
            config.require(dep_reference, dep_tag).unwrap();
        }
        Arc::new(Package::new(commit, config))
    }

    #[test]
    fn test_cross_major_candidates_strict_error_relaxed_highest() {
        // Two assignments disagree on r's major line. Strict construction
        // must refuse; relaxed construction keeps the highest line, drops
        // the assignment built on the lower one, and the selection stays
        // internally consistent with the surviving assignment.
        let x = synthetic("acme/x", "v1.0.0", &[("acme/r", "v1.0.0")]);
        let y = synthetic("acme/y", "v1.0.0", &[("acme/r", "v2.0.0")]);
        let r1 = synthetic("acme/r", "v1.0.0", &[]);
        let r2 = synthetic("acme/r", "v2.0.0", &[]);

        let mut first = Assignment::new();
        first.insert("github.com/acme/x".into(), DomainValue::Concrete(Arc::clone(&x)));
        first.insert("github.com/acme/y".into(), DomainValue::Absence);
        first.insert("github.com/acme/r".into(), DomainValue::Concrete(Arc::clone(&r1)));

        let mut second = Assignment::new();
        second.insert("github.com/acme/x".into(), DomainValue::Absence);
        second.insert("github.com/acme/y".into(), DomainValue::Concrete(Arc::clone(&y)));
        second.insert("github.com/acme/r".into(), DomainValue::Concrete(Arc::clone(&r2)));

        let solutions = vec![first, second];
        let requirements = IndexMap::new();

        let err = Optimizer::build(solutions.clone(), &requirements, false).unwrap_err();
        assert!(matches!(err, ResolverError::VersionIncompatibility(_)));

        let optimizer = Optimizer::build(solutions, &requirements, true).unwrap();
        let packages = optimizer.maximize().unwrap();
        assert_eq!(
            selected_tags(&packages),
            vec![
                ("github.com/acme/r".to_string(), "v2.0.0".to_string()),
                ("github.com/acme/y".to_string(), "v1.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_development_outranks_releases() {
        let mut host = InMemoryHost::new();
        host.publish_leaf("acme/a", "development");
        let mut manifest = ProjectManifest::new();
        manifest.require("acme/a", "development");

        let solutions = enumerate(&host, &manifest, false);
        let requirements = manifest.requirements().unwrap();
        let optimizer = Optimizer::build(solutions, &requirements, false).unwrap();
        let packages = optimizer.maximize().unwrap();

        assert_eq!(packages.len(), 1);
        assert!(packages[0].tag().is_development());
    }
}
