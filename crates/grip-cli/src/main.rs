mod resolve;
mod why;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser, Debug)]
#[command(name = "grip")]
#[command(about = "Dependency resolver for git-hosted packages")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the project's requirements and print the pinned set
    Resolve(resolve::ResolveArgs),

    /// Show which resolved packages depend on a repository
    Why(why::WhyArgs),
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let result = match args.command {
        Commands::Resolve(args) => resolve::run(args),
        Commands::Why(args) => why::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
