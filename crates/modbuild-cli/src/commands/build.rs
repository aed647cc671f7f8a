//! Build command implementation

use camino::Utf8Path;
use clap::Args;
use miette::Result;

use modbuild_core::build::Builder;
use modbuild_core::layout::Layout;
use modbuild_core::manifest::Manifest;
use modbuild_core::toolchain::Toolchain;
use modbuild_core::variant::Variant;

/// Arguments for the build command
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Targets or standalone groups to build (default: everything)
    pub targets: Vec<String>,

    /// Build the release variant
    #[arg(long)]
    pub release: bool,

    /// Dry run - show what would be built
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the build command
pub fn run(project_root: &Utf8Path, args: BuildArgs) -> Result<()> {
    let manifest = Manifest::load(project_root)?;

    let variant = if args.release {
        Variant::Release
    } else {
        Variant::Debug
    };
    let layout = Layout::new(project_root, &manifest.layout, variant);
    let toolchain = Toolchain::configure(&manifest, &layout, variant)?;

    if args.dry_run {
        return dry_run(&manifest, &layout, &toolchain, &args.targets);
    }

    layout.ensure_directories(&manifest)?;

    let result = Builder::new(&manifest, &layout, &toolchain).run(&args.targets)?;

    if result.is_noop() {
        tracing::info!("Nothing to do, everything is up to date");
    } else {
        tracing::info!("Build complete!");
    }
    Ok(())
}

/// Print the work a build would perform, without touching the build tree
fn dry_run(
    manifest: &Manifest,
    layout: &Layout,
    toolchain: &Toolchain,
    targets: &[String],
) -> Result<()> {
    let plan = Builder::new(manifest, layout, toolchain).plan(targets)?;

    if plan.is_noop() {
        println!("Nothing to do, everything is up to date");
        return Ok(());
    }

    println!("Would run the following steps in order:");
    for header in &plan.headers {
        println!("  - precompile system header {}", header);
    }
    for executable in &plan.standalone {
        println!("  - build {}", executable);
    }
    for task in &plan.tasks {
        println!("  - compile {}", task.source);
    }
    for name in &plan.links {
        println!("  - link {}", name);
    }
    Ok(())
}
