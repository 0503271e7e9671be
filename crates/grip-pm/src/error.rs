use thiserror::Error;

use crate::source::SourceHostError;

#[derive(Error, Debug)]
pub enum ResolverError {
    // Manifest errors
    #[error("Failed to parse manifest: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    // Reference errors
    #[error("Invalid repository reference \"{reference}\": {reason}")]
    InvalidRepository { reference: String, reason: String },

    #[error(transparent)]
    InvalidTag(#[from] grip_semver::SemVerError),

    // Source host errors, with the lookup that failed
    #[error("Failed to fetch {repository}@{tag}: {source}")]
    SourceHost {
        repository: String,
        tag: String,
        #[source]
        source: SourceHostError,
    },

    // Solver errors
    #[error("Version incompatibility: {0}. Re-run with --ignore-version-compatibility to keep the highest incompatible line")]
    VersionIncompatibility(String),

    #[error("Repository {repository} is required both as a development branch and as a tagged release")]
    MixedVersions { repository: String },

    #[error("Could not resolve dependencies: {0}")]
    DependencyResolution(String),

    #[error("Dependency search exhausted its node budget after {visited} nodes")]
    SearchExhausted { visited: u64 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
