//! CLI command definitions and dispatch.

pub mod build;
pub mod plan;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use linkpack_common::config::BuildConfig;

/// linkpack — resolve linked files into content-addressed blobs.
#[derive(Parser, Debug)]
#[command(name = "lpk", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a workspace, write the resolved files, and optionally publish them.
    Build(build::BuildArgs),
    /// Show the resolution order and links of a workspace without writing anything.
    Plan(plan::PlanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build::execute(args),
        Command::Plan(args) => plan::execute(args),
    }
}

/// Fails unless `dir` is an existing directory.
fn require_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("workspace directory not found: {}", dir.display());
    }
    Ok(())
}

/// Loads the build configuration, or the empty one when no path is given.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<BuildConfig> {
    match path {
        Some(path) => Ok(BuildConfig::load(path)?),
        None => Ok(BuildConfig::default()),
    }
}
