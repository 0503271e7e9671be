pub mod dependents;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod repository;
pub mod solver;
pub mod source;

pub use dependents::{dependents_of, Dependent};
pub use error::{ResolverError, Result};
pub use graph::{PackageGroups, RepoGroup};
pub use manifest::ProjectManifest;
pub use package::{Commit, Package, PackageConfig, RawConfig, Tag, Version, DEVELOPMENT_TAG};
pub use repository::Repository;
pub use solver::{resolve, Assignment, ConstraintSolver, DomainValue, Optimizer};
pub use source::{InMemoryHost, RegistrySnapshot, SnapshotPackage, SourceHost, SourceHostError};
