//! plaincode - track a project and report what changed since the last run.
//!
//! This is the main entry point for the plaincode CLI.

mod commands;
mod project;

use clap::{Parser, Subcommand};
use commands::{handle_diff, handle_reset, init_logging, DiffArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plaincode")]
#[command(author, version, about = "Track project changes as line diffs", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report changes since the last run and record the current state
    Diff(DiffArgs),
    /// Forget the recorded state so the next diff starts a new baseline
    Reset {
        /// Project root (defaults to the current directory)
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file);

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Diff(args) => {
            let root = project::resolve_root(args.root.clone())?;
            handle_diff(&root, &args, &mut stdout).await
        }
        Commands::Reset { root } => {
            let root = project::resolve_root(root)?;
            handle_reset(&root, &mut stdout).await
        }
    }
}
