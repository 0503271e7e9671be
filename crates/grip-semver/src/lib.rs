//! Version tag parsing and ordering for git-hosted packages.
//!
//! Packages are published as git tags of the form `MAJOR.MINOR.PATCH`,
//! optionally prefixed with `v` and optionally carrying a trailing suffix
//! (`-beta.1`, `+build`, ...). Ordering only considers the three numeric
//! components; suffixes are preserved for display but ignored for
//! comparison.

mod semver;

pub use semver::{SemVer, SemVerError};
