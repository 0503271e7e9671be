use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use grip_pm::{Package, PackageGroups, ProjectManifest, RegistrySnapshot};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to the project manifest
    #[arg(long, default_value = "grip.json")]
    pub manifest: PathBuf,

    /// Path to the registry snapshot to resolve against
    #[arg(long)]
    pub registry: PathBuf,

    /// Allow dependants to disagree on major versions; the highest line wins
    #[arg(short = 'f', long, alias = "force")]
    pub ignore_version_compatibility: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let (_, packages) = resolved_set(
        &args.manifest,
        &args.registry,
        args.ignore_version_compatibility,
    )?;

    if packages.is_empty() {
        println!("{}", "Nothing to install".dimmed());
        return Ok(());
    }

    println!(
        "{} {} package(s)",
        "Resolved".green().bold(),
        packages.len()
    );
    for package in &packages {
        let hash = &package.commit.hash;
        println!(
            "  {} {} {}",
            package.repository().identity(),
            package.tag().as_str().cyan(),
            format!("({})", &hash[..hash.len().min(8)]).dimmed()
        );
    }
    Ok(())
}

/// Load the manifest and the snapshot, then run the resolver.
pub(crate) fn resolved_set(
    manifest_path: &Path,
    registry_path: &Path,
    ignore_version_compatibility: bool,
) -> Result<(ProjectManifest, Vec<Arc<Package>>)> {
    log::debug!(
        "Resolving {} against {}",
        manifest_path.display(),
        registry_path.display()
    );
    let manifest = ProjectManifest::from_path(manifest_path)
        .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;
    let host = RegistrySnapshot::from_path(registry_path)
        .with_context(|| format!("failed to load registry {}", registry_path.display()))?
        .into_host()?;

    let groups = PackageGroups::build(&manifest, &host)?;
    let packages = grip_pm::resolve(&groups, &manifest, ignore_version_compatibility)?;
    Ok((manifest, packages))
}
