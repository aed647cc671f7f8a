//! modbuild CLI - incremental builds for C++ module projects

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// modbuild - incremental builds for C++ module projects
#[derive(Debug, Parser)]
#[command(name = "modbuild")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory
    #[arg(short = 'C', long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build targets and standalone executables
    Build(commands::build::BuildArgs),

    /// Remove build artifacts
    Clean(commands::clean::CleanArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Determine project root
    let project_root = if let Some(ref path) = cli.project {
        camino::Utf8PathBuf::from(path)
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|p| camino::Utf8PathBuf::try_from(p).ok())
            .unwrap_or_else(|| camino::Utf8PathBuf::from("."))
    };

    match cli.command {
        Commands::Build(args) => commands::build::run(&project_root, args),
        Commands::Clean(args) => commands::clean::run(&project_root, args),
    }
}
