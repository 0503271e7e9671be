use std::fmt;
use std::sync::Arc;

use crate::package::Package;

/// The value a repository variable can take in a candidate assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainValue {
    /// The repository is not needed
    Absence,
    /// The repository is the root project itself; once assigned it is
    /// excluded from further constraint checking
    ProjectLocal,
    /// One specific fetched package
    Concrete(Arc<Package>),
}

impl DomainValue {
    pub fn is_absence(&self) -> bool {
        matches!(self, DomainValue::Absence)
    }

    pub fn is_project(&self) -> bool {
        matches!(self, DomainValue::ProjectLocal)
    }

    pub fn as_package(&self) -> Option<&Arc<Package>> {
        match self {
            DomainValue::Concrete(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainValue::Absence => write!(f, "absent"),
            DomainValue::ProjectLocal => write!(f, "project"),
            DomainValue::Concrete(p) => write!(f, "{}", p),
        }
    }
}

/// Order a variable's domain for the search: project first, then absence,
/// then development candidates in discovery order, then tagged releases
/// ascending.
///
/// This ordering only shapes the search; which complete assignment is best
/// is decided later by the optimizer.
pub fn order_domain(values: Vec<DomainValue>) -> Vec<DomainValue> {
    let mut project = Vec::new();
    let mut absence = Vec::new();
    let mut development = Vec::new();
    let mut stable = Vec::new();

    for value in values {
        match &value {
            DomainValue::ProjectLocal => project.push(value),
            DomainValue::Absence => absence.push(value),
            DomainValue::Concrete(p) if p.tag().is_development() => development.push(value),
            DomainValue::Concrete(_) => stable.push(value),
        }
    }

    stable.sort_by(|a, b| {
        let (Some(a), Some(b)) = (a.as_package(), b.as_package()) else {
            return std::cmp::Ordering::Equal;
        };
        a.tag()
            .as_semver()
            .cmp(&b.tag().as_semver())
            .then_with(|| a.commit.hash.cmp(&b.commit.hash))
    });

    let mut ordered = project;
    ordered.extend(absence);
    ordered.extend(development);
    ordered.extend(stable);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Commit, PackageConfig, Version};

    fn concrete(tag: &str) -> DomainValue {
        let version = Version::parse("acme/widgets", tag).unwrap();
        let commit = Commit::new(version, format!("hash-{tag}"));
        DomainValue::Concrete(Arc::new(Package::new(commit, PackageConfig::new())))
    }

    #[test]
    fn test_order_domain() {
        let ordered = order_domain(vec![
            concrete("v2.0.0"),
            DomainValue::Absence,
            concrete("development"),
            concrete("v1.4.0"),
            DomainValue::ProjectLocal,
            concrete("v1.10.0"),
        ]);

        let shape: Vec<String> = ordered
            .iter()
            .map(|v| match v {
                DomainValue::ProjectLocal => "project".to_string(),
                DomainValue::Absence => "absent".to_string(),
                DomainValue::Concrete(p) => p.tag().as_str().to_string(),
            })
            .collect();

        assert_eq!(
            shape,
            vec!["project", "absent", "development", "v1.4.0", "v1.10.0", "v2.0.0"]
        );
    }
}
