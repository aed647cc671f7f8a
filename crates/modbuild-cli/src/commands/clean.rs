//! Clean command implementation

use camino::Utf8Path;
use clap::Args;
use miette::{IntoDiagnostic, Result};

use modbuild_core::layout::Layout;
use modbuild_core::manifest::Manifest;
use modbuild_core::variant::Variant;

/// Arguments for the clean command
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Also remove the module interface cache
    #[arg(long)]
    pub interfaces: bool,
}

/// Run the clean command
pub fn run(project_root: &Utf8Path, args: CleanArgs) -> Result<()> {
    let manifest = Manifest::load(project_root)?;
    // Only directory locations are needed; the variant is irrelevant here
    let layout = Layout::new(project_root, &manifest.layout, Variant::Debug);

    remove_tree(layout.build_dir())?;
    if args.interfaces {
        remove_tree(layout.interface_dir())?;
    }
    Ok(())
}

fn remove_tree(dir: &Utf8Path) -> Result<()> {
    if !dir.exists() {
        tracing::debug!("{} does not exist, nothing to remove", dir);
        return Ok(());
    }
    std::fs::remove_dir_all(dir).into_diagnostic()?;
    tracing::info!("Removed {}", dir);
    Ok(())
}
