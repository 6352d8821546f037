//! `lpk build` — Resolve a workspace and publish the result.

use std::path::{Path, PathBuf};

use clap::Args;
use linkpack_builder::{BuildOptions, BuildReport, CancelToken, build_workspace};
use linkpack_common::constants::{APP_NAME, DEFAULT_OUTPUT_DIR};
use linkpack_registry::{
    ImageTarget, LayoutWriter, ManifestBuilder, Reference, RegistryOptions, RemoteRegistry,
};
use linkpack_workspace::{LocalWorkspace, ParserRegistry};

use crate::output::{format_bytes, short_digest};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Workspace directory to build.
    pub dir: PathBuf,

    /// Directory the resolved files are written to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// YAML file assigning attributes to workspace files.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Push the result to the destination registry.
    #[arg(short, long, requires = "destination")]
    pub push: bool,

    /// Destination reference, `registry/repository[:tag]`.
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Also write the image into an OCI image layout directory.
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Accept invalid TLS certificates from the registry.
    #[arg(long)]
    pub insecure: bool,

    /// Use plain HTTP to reach the registry.
    #[arg(long)]
    pub plain_http: bool,

    /// Worker threads used to resolve independent files.
    #[arg(short = 'j', long, default_value_t = 1)]
    pub workers: usize,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if validation, resolution, or publishing fails.
pub fn execute(args: BuildArgs) -> anyhow::Result<()> {
    super::require_dir(&args.dir)?;
    reject_nested_output(&args.dir, &args.output)?;
    let destination = args
        .destination
        .as_deref()
        .map(str::parse::<Reference>)
        .transpose()?;

    let config = super::load_config(args.config.as_ref())?;
    let source = LocalWorkspace::open(&args.dir)?;
    let output = LocalWorkspace::open(&args.output)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let options = BuildOptions {
        workers: args.workers,
        cancel: cancel.clone(),
        parsers: ParserRegistry::default(),
    };
    tracing::info!(dir = %args.dir.display(), workers = args.workers, "building workspace");
    let report = build_workspace(&source, &output, &config, &options)?;
    print_report(&report, &args.output);

    if args.layout.is_none() && !args.push {
        return Ok(());
    }

    let image = ManifestBuilder::from_report(&report).build()?;
    let reference = match destination {
        Some(reference) => reference,
        None => format!("local/{APP_NAME}").parse()?,
    };

    if let Some(dir) = &args.layout {
        let digest = LayoutWriter::open(dir)?
            .with_cancel(cancel.clone())
            .publish(&reference, &image)?;
        eprintln!(
            "  {GREEN}Layout{RESET} {} {DIM}{}{RESET}",
            dir.display(),
            short_digest(&digest)
        );
    }

    if args.push {
        let registry = RemoteRegistry::new(RegistryOptions {
            insecure: args.insecure,
            plain_http: args.plain_http,
        })?
        .with_cancel(cancel);
        let digest = registry.publish(&reference, &image)?;
        eprintln!("  {GREEN}Pushed{RESET} {reference} {DIM}{digest}{RESET}");
    }
    Ok(())
}

/// Building into a directory inside the source would index earlier output.
fn reject_nested_output(source: &Path, output: &Path) -> anyhow::Result<()> {
    let source = source.canonicalize()?;
    let output = absolute(output)?;
    if output.starts_with(&source) {
        anyhow::bail!(
            "output directory {} must not be inside the workspace {}",
            output.display(),
            source.display()
        );
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(parent.canonicalize()?.join(name)),
        _ => Ok(path),
    }
}

fn print_report(report: &BuildReport, output: &Path) {
    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}Resolved {}{RESET} file(s) into {}:",
        report.descriptors.len(),
        output.display()
    );
    for (name, descriptor) in report.descriptors.iter() {
        eprintln!(
            "    {BOLD}{name}{RESET} {DIM}{} {}{RESET}",
            short_digest(&descriptor.digest),
            format_bytes(descriptor.size)
        );
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_output_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("out");
        assert!(reject_nested_output(dir.path(), &nested).is_err());
    }

    #[test]
    fn sibling_output_is_accepted() {
        let src = tempfile::tempdir().expect("src");
        let out = tempfile::tempdir().expect("out");
        assert!(reject_nested_output(src.path(), out.path()).is_ok());
    }
}
