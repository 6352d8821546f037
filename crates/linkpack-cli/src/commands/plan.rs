//! `lpk plan` — Show how a workspace would be resolved.

use std::path::PathBuf;

use clap::Args;
use linkpack_builder::{BuildOptions, plan_workspace};
use linkpack_workspace::LocalWorkspace;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Workspace directory to inspect.
    pub dir: PathBuf,

    /// YAML file assigning attributes to workspace files.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Executes the `plan` command.
///
/// Indexes the workspace, builds the link graph, computes the resolution
/// order, and lists every file with its outgoing links.
///
/// # Errors
///
/// Returns an error if indexing fails or the links form a cycle.
pub fn execute(args: PlanArgs) -> anyhow::Result<()> {
    super::require_dir(&args.dir)?;
    let config = super::load_config(args.config.as_ref())?;
    let source = LocalWorkspace::open(&args.dir)?;

    let graph = plan_workspace(&source, &config, &BuildOptions::default())?;
    let order = graph.topological_order()?;

    println!("Link plan for: {}", args.dir.display());
    println!("{}", "\u{2550}".repeat(35));
    println!();

    for name in &order {
        println!("  {name}");
        for link in graph.outgoing(name)? {
            println!("      {} -> {}", link.edge.variable, link.target);
        }
    }

    println!();
    println!(
        "  {} file(s), {} link(s), resolved in the order shown.",
        order.len(),
        graph.edge_count()
    );
    Ok(())
}
