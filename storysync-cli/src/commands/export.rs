//! `storysync export`: write Linear issues to a story document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::debug;

use storysync_core::config;
use storysync_linear::{ExportFilter, HttpClient};
use storysync_sync::{export_records, ExportOptions, FsStore};

use super::runtime;

/// Arguments for `storysync export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Document to write (replaced if it exists).
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,

    /// Team name, key, or id.
    #[arg(long)]
    pub team: Option<String>,

    /// Project name or id.
    #[arg(long)]
    pub project: Option<String>,

    /// Issue id or identifier such as ENG-123; repeatable.
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Workflow state name, e.g. "In Progress".
    #[arg(long)]
    pub status: Option<String>,

    /// Assignee email, name, or `me`.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Creator email, name, or `me`.
    #[arg(long)]
    pub creator: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load().context("failed to load config")?;
        let client = HttpClient::new(config.require_api_key()?)
            .context("failed to create Linear client")?;

        let options = ExportOptions {
            config,
            filters: ExportFilter {
                team: self.team,
                project: self.project,
                identifiers: self.ids,
                status: self.status,
                assignee: self.assignee,
                creator: self.creator,
            },
            team_override: None,
            output_path: self.output,
        };

        debug!(output = %options.output_path.display(), "starting export");
        let outcome = runtime()?
            .block_on(export_records(&client, &FsStore, &options))
            .context("export failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
            );
        } else {
            println!(
                "{} exported {} issues to {}",
                "✓".green().bold(),
                outcome.count,
                outcome.output_path.display()
            );
        }
        Ok(())
    }
}
