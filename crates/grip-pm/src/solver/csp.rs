//! Backtracking search over "which value does each repository take".
//!
//! One variable per distinct repository; the search enumerates every
//! complete assignment that satisfies all constraint families. Picking the
//! best assignment is the optimizer's job, not the search's.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ResolverError, Result};
use crate::graph::PackageGroups;
use crate::manifest::ProjectManifest;
use crate::package::{Commit, Package, Tag, Version};

use super::domain::{order_domain, DomainValue};

/// Upper bound on visited search nodes. Deduplicated real-world graphs stay
/// far below this; hitting it turns a pathological input into a typed error
/// instead of a hang.
const MAX_SEARCH_NODES: u64 = 1_000_000;

/// A complete or partial assignment of repositories to values, keyed by
/// repository identity.
pub type Assignment = IndexMap<String, DomainValue>;

/// One repository variable with its ordered candidate values.
#[derive(Debug, Clone)]
struct Variable {
    identity: String,
    domain: Vec<DomainValue>,
}

/// Everything the constraint functions need besides the assignment itself.
struct ConstraintContext<'a> {
    /// Root requirements keyed by repository identity, declaration order
    requirements: &'a IndexMap<String, Version>,
    /// Major-version equality between dependants and dependencies is waived
    /// when set
    relaxed: bool,
    /// Total number of variables; constraints that need the full picture
    /// stay vacuous until the assignment reaches this size
    variable_count: usize,
    /// Commits already pinned for root-required repositories in this search
    fixed: &'a HashMap<String, Commit>,
}

/// Mutable search state threaded through the recursion.
struct SearchState {
    fixed: HashMap<String, Commit>,
    visited: u64,
    solutions: Vec<Assignment>,
}

/// The constraint solver: enumerates every valid complete assignment for
/// one fixed candidate set.
///
/// Strict and relaxed runs each build their own instance; nothing carries
/// over between solves.
pub struct ConstraintSolver {
    variables: Vec<Variable>,
    requirements: IndexMap<String, Version>,
    relaxed: bool,
}

impl ConstraintSolver {
    pub fn new(
        groups: &PackageGroups,
        manifest: &ProjectManifest,
        relaxed: bool,
    ) -> Result<Self> {
        let requirements = manifest.requirements()?;

        let variables = groups
            .iter()
            .map(|(identity, group)| {
                let clashes = group.packages.iter().any(|p| {
                    p.config
                        .map
                        .keys()
                        .any(|namespace| manifest.map.contains_key(namespace))
                });

                let domain = if clashes {
                    // The repository collides with the project's own
                    // namespaces: only the project-local copy can satisfy it
                    vec![DomainValue::ProjectLocal]
                } else {
                    let mut values = vec![DomainValue::Absence];
                    values.extend(
                        group
                            .packages
                            .iter()
                            .map(|p| DomainValue::Concrete(Arc::clone(p))),
                    );
                    order_domain(values)
                };

                Variable {
                    identity: identity.clone(),
                    domain,
                }
            })
            .collect();

        Ok(Self {
            variables,
            requirements,
            relaxed,
        })
    }

    /// Enumerate every complete satisfying assignment.
    pub fn solve(&self) -> Result<Vec<Assignment>> {
        let mut state = SearchState {
            fixed: HashMap::new(),
            visited: 0,
            solutions: Vec::new(),
        };
        let mut assignment = Assignment::new();
        self.search(&mut assignment, &mut state)?;

        log::debug!(
            "Search visited {} nodes, found {} satisfying assignments ({} variables, relaxed={})",
            state.visited,
            state.solutions.len(),
            self.variables.len(),
            self.relaxed
        );
        Ok(state.solutions)
    }

    fn search(&self, assignment: &mut Assignment, state: &mut SearchState) -> Result<()> {
        let Some(variable) = self.select_variable(assignment) else {
            // All variables assigned; every constraint held at the final
            // assignment step, so this is a solution.
            self.pin_root_commits(assignment, state);
            state.solutions.push(assignment.clone());
            return Ok(());
        };

        for value in &variable.domain {
            state.visited += 1;
            if state.visited > MAX_SEARCH_NODES {
                return Err(ResolverError::SearchExhausted {
                    visited: state.visited,
                });
            }

            assignment.insert(variable.identity.clone(), value.clone());
            if self.satisfied(assignment, &variable.identity, value, state) {
                self.search(assignment, state)?;
            }
            assignment.shift_remove(&variable.identity);
        }
        Ok(())
    }

    /// Pick the next unassigned variable: the first still-unassigned
    /// root-declared repository in declaration order, otherwise the first
    /// unassigned variable in discovery order.
    fn select_variable(&self, assignment: &Assignment) -> Option<&Variable> {
        for identity in self.requirements.keys() {
            if assignment.contains_key(identity) {
                continue;
            }
            if let Some(variable) = self.variables.iter().find(|v| &v.identity == identity) {
                return Some(variable);
            }
        }
        self.variables
            .iter()
            .find(|v| !assignment.contains_key(&v.identity))
    }

    /// Run every constraint family against the assignment extended with
    /// `(identity, value)`.
    fn satisfied(
        &self,
        assignment: &Assignment,
        identity: &str,
        value: &DomainValue,
        state: &SearchState,
    ) -> bool {
        let ctx = ConstraintContext {
            requirements: &self.requirements,
            relaxed: self.relaxed,
            variable_count: self.variables.len(),
            fixed: &state.fixed,
        };

        constraints::empty_manifest_implies_absence(assignment, identity, value, &ctx)
            && constraints::root_requirement_present(assignment, identity, value, &ctx)
            && constraints::root_dependencies_present(assignment, identity, value, &ctx)
            && constraints::transitive_dependencies_present(assignment, identity, value, &ctx)
            && constraints::versions_satisfied(assignment, identity, value, &ctx)
            && constraints::dependants_exist_and_match(assignment, identity, value, &ctx)
    }

    /// Remember the commit each root-required repository took in the first
    /// solution that used it. Later branches proposing a different commit
    /// for the same repository are rejected, which keeps the search from
    /// deriving conflicting pinned choices.
    fn pin_root_commits(&self, assignment: &Assignment, state: &mut SearchState) {
        for identity in self.requirements.keys() {
            if state.fixed.contains_key(identity) {
                continue;
            }
            if let Some(package) = assignment.get(identity).and_then(DomainValue::as_package) {
                state.fixed.insert(identity.clone(), package.commit.clone());
            }
        }
    }
}

/// Whether a chosen tag satisfies a declared minimum.
///
/// Development tags have no semantic order: development-to-development is
/// always satisfied, and a mixed pairing is incomparable, which at this
/// level means unconstrained. The contradiction a mixed pairing represents
/// is surfaced later, when the optimizer sees both a development and a
/// stable candidate selected for one repository.
pub(super) fn satisfies_minimum(required: &Tag, chosen: &Tag) -> bool {
    match (required.as_semver(), chosen.as_semver()) {
        (Some(required), Some(chosen)) => required <= chosen,
        _ => true,
    }
}

/// Major-version equality between a declared requirement and a chosen tag.
/// Vacuous unless both are tagged releases.
pub(super) fn majors_match(required: &Tag, chosen: &Tag) -> bool {
    match (required.as_semver(), chosen.as_semver()) {
        (Some(required), Some(chosen)) => required.major() == chosen.major(),
        _ => true,
    }
}

/// The root-level rule is stricter than the dependant-level one: the
/// project's own pin may not mix a development requirement with a tagged
/// release in either direction.
fn root_pin_satisfied(required: &Tag, chosen: &Tag) -> bool {
    match (required, chosen) {
        (Tag::Development, Tag::Development) => true,
        (Tag::Development, _) | (_, Tag::Development) => false,
        _ => satisfies_minimum(required, chosen),
    }
}

mod constraints {
    use super::*;

    fn complete(assignment: &Assignment, ctx: &ConstraintContext) -> bool {
        assignment.len() == ctx.variable_count
    }

    fn concrete_entries<'a>(
        assignment: &'a Assignment,
    ) -> impl Iterator<Item = (&'a String, &'a Arc<Package>)> {
        assignment
            .iter()
            .filter_map(|(identity, value)| value.as_package().map(|p| (identity, p)))
    }

    /// 1. A project with no declared packages needs nothing at all.
    pub(super) fn empty_manifest_implies_absence(
        _assignment: &Assignment,
        _identity: &str,
        value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if ctx.requirements.is_empty() {
            return value.is_absence();
        }
        true
    }

    /// 2. Every root-declared repository must resolve to a real package.
    pub(super) fn root_requirement_present(
        _assignment: &Assignment,
        identity: &str,
        value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if ctx.requirements.contains_key(identity) {
            return value.as_package().is_some();
        }
        true
    }

    /// 3. Dependencies declared by root-required packages must not be absent.
    pub(super) fn root_dependencies_present(
        assignment: &Assignment,
        _identity: &str,
        _value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if !complete(assignment, ctx) {
            return true;
        }
        for identity in ctx.requirements.keys() {
            let Some(package) = assignment.get(identity).and_then(DomainValue::as_package) else {
                continue;
            };
            for dependency in package.config.packages.values() {
                if let Some(value) = assignment.get(&dependency.repository.identity()) {
                    if value.is_absence() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// 4. Same as 3, for every other selected package.
    pub(super) fn transitive_dependencies_present(
        assignment: &Assignment,
        _identity: &str,
        _value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if !complete(assignment, ctx) {
            return true;
        }
        for (identity, package) in concrete_entries(assignment) {
            if ctx.requirements.contains_key(identity) {
                continue;
            }
            for dependency in package.config.packages.values() {
                if let Some(value) = assignment.get(&dependency.repository.identity()) {
                    if value.is_absence() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// 5. Declared minimum tags may not exceed the chosen tags.
    ///
    /// The root-level pin fails the whole assignment immediately; dependant
    /// relationships are all checked before the verdict so no violation is
    /// masked by an earlier one.
    pub(super) fn versions_satisfied(
        assignment: &Assignment,
        _identity: &str,
        _value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if !complete(assignment, ctx) {
            return true;
        }
        for (identity, package) in concrete_entries(assignment) {
            if let Some(required) = ctx.requirements.get(identity) {
                if !root_pin_satisfied(&required.tag, package.tag()) {
                    return false;
                }
            }

            let mut all_satisfied = true;
            for (_, dependant) in concrete_entries(assignment) {
                if dependant.commit == package.commit {
                    continue;
                }
                if let Some(declared) = dependant.declares(identity) {
                    if !satisfies_minimum(&declared.tag, package.tag()) {
                        all_satisfied = false;
                    }
                }
            }
            if !all_satisfied {
                return false;
            }
        }
        true
    }

    /// 6. Every selected non-root package needs at least one selected
    /// dependant, and every dependant relationship must be compatible,
    /// including major-version equality unless relaxed. Root-required
    /// repositories must also stay on the commit pinned by the first
    /// solution that used them.
    pub(super) fn dependants_exist_and_match(
        assignment: &Assignment,
        identity: &str,
        value: &DomainValue,
        ctx: &ConstraintContext,
    ) -> bool {
        if ctx.requirements.contains_key(identity) {
            if let (Some(package), Some(fixed)) = (value.as_package(), ctx.fixed.get(identity)) {
                if *fixed != package.commit {
                    return false;
                }
            }
        }

        if !complete(assignment, ctx) {
            return true;
        }
        for (identity, package) in concrete_entries(assignment) {
            if ctx.requirements.contains_key(identity) {
                continue;
            }

            let mut has_dependant = false;
            for (_, dependant) in concrete_entries(assignment) {
                if dependant.commit == package.commit {
                    continue;
                }
                let Some(declared) = dependant.declares(identity) else {
                    continue;
                };
                has_dependant = true;
                if !satisfies_minimum(&declared.tag, package.tag()) {
                    return false;
                }
                if !ctx.relaxed && !majors_match(&declared.tag, package.tag()) {
                    return false;
                }
            }
            if !has_dependant {
                return false;
            }
        }
        true
    }
}
