use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use grip_pm::{dependents_of, Dependent, Repository};

use crate::resolve::resolved_set;

#[derive(Args, Debug)]
pub struct WhyArgs {
    /// Repository to explain (any accepted reference form)
    pub repository: String,

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

pub fn run(args: WhyArgs) -> Result<()> {
    let target = Repository::parse(&args.repository)?;
    let identity = target.identity();

    let (manifest, packages) = resolved_set(
        &args.manifest,
        &args.registry,
        args.ignore_version_compatibility,
    )?;

    if !packages
        .iter()
        .any(|p| p.repository().identity() == identity)
    {
        bail!("{identity} is not part of the resolved set");
    }

    if manifest.requirements()?.contains_key(&identity) {
        println!("{} is required by the project itself", identity.bold());
    }

    let dependants = dependents_of(&packages, &identity);
    if dependants.is_empty() {
        println!("No resolved package depends on {}", identity.bold());
        return Ok(());
    }

    println!("{} is needed by:", identity.bold());
    print_tree(&dependants, 1);
    Ok(())
}

fn print_tree(dependants: &[Dependent], depth: usize) {
    for dependant in dependants {
        println!(
            "{}{} {} {}",
            "  ".repeat(depth),
            dependant.package.repository().identity(),
            dependant.package.tag().as_str().cyan(),
            format!("(declares {})", dependant.declared_tag).dimmed()
        );
        print_tree(&dependant.children, depth + 1);
    }
}
