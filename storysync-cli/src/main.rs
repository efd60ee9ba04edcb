//! storysync: keep markdown story documents and Linear issues in step.
//!
//! # Usage
//!
//! ```text
//! storysync import <PATH>... [--team T] [--project P] [--dry-run] [--no-write-back] [--json]
//! storysync export --output <FILE> [--team T] [--project P] [--id ID]... [--status S]
//!                  [--assignee A] [--creator C] [--json]
//! storysync check <PATH>... [--json]
//! storysync config show [--json]
//! storysync config set [--api-key K] [--team T] [--project P] [--labels a,b]
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=storysync=debug` for resolver and API detail.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, config::ConfigCommand, export::ExportArgs, import::ImportArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "storysync",
    version,
    about = "Sync markdown story documents with Linear issues",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update Linear issues from story documents.
    Import(ImportArgs),

    /// Write matching Linear issues to a story document.
    Export(ExportArgs),

    /// Parse story documents without contacting Linear.
    Check(CheckArgs),

    /// Show or change ~/.storysync/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => args.run(),
        Commands::Export(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
