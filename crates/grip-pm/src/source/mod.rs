//! The source-host boundary: everything the resolver needs from the outside
//! world, behind one trait.
//!
//! Fetching is the only part of the pipeline that touches the network; the
//! solver itself only ever sees the in-memory structures a host returns.

mod memory;
mod snapshot;

use thiserror::Error;

use crate::package::{Commit, PackageConfig, Tag};
use crate::repository::Repository;

pub use memory::InMemoryHost;
pub use snapshot::{RegistrySnapshot, SnapshotPackage};

/// Failures a source host can report. The graph builder wraps these with the
/// repository and tag being fetched; they are never swallowed.
#[derive(Error, Debug)]
pub enum SourceHostError {
    #[error("tag not found")]
    TagNotFound,

    #[error("no metadata for commit {hash}")]
    CommitNotFound { hash: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// A host that can resolve version tags to commits and serve each commit's
/// declared configuration.
pub trait SourceHost {
    /// Resolve a tag to the commit it currently points at. For development
    /// tags this is the head of the default branch.
    fn resolve_commit(
        &self,
        repository: &Repository,
        tag: &Tag,
    ) -> Result<Commit, SourceHostError>;

    /// Fetch the configuration a commit declares.
    fn fetch_config(&self, commit: &Commit) -> Result<PackageConfig, SourceHostError>;
}
