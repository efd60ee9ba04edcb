//! `storysync import`: push story documents to Linear.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use storysync_core::{config, ImportAction, ImportResult, ImportSummary};
use storysync_linear::HttpClient;
use storysync_sync::{import_documents, FsStore, ImportOptions};

use super::{expand_paths, runtime, short_name};

/// Arguments for `storysync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Story documents, or directories containing `*.md` documents.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Team for stories whose document names none (before `default_team`).
    #[arg(long)]
    pub team: Option<String>,

    /// Project for stories whose document names none (before `default_project`).
    #[arg(long)]
    pub project: Option<String>,

    /// Parse and report only; nothing is sent and nothing is written.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not write new Linear ids back into the documents.
    #[arg(long)]
    pub no_write_back: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load().context("failed to load config")?;
        let api_key = if self.dry_run {
            config.api_key.clone().unwrap_or_default()
        } else {
            config.require_api_key()?.to_string()
        };
        let client = HttpClient::new(api_key).context("failed to create Linear client")?;

        let options = ImportOptions {
            document_paths: expand_paths(&self.paths)?,
            config,
            team_override: self.team,
            project_override: self.project,
            dry_run: self.dry_run,
            skip_write_back: self.no_write_back,
        };
        if options.document_paths.is_empty() {
            bail!("no story documents found");
        }
        debug!(
            documents = options.document_paths.len(),
            dry_run = options.dry_run,
            write_back = !options.skip_write_back,
            "starting import"
        );

        let summary = runtime()?.block_on(import_documents(&client, &FsStore, &options));

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
            );
        } else {
            print_summary(&summary, self.dry_run);
        }

        if !summary.is_success() {
            bail!(
                "import finished with {} failed stories and {} failed documents",
                summary.failed,
                summary.document_failures.len()
            );
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "story")]
    story: String,
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "linear")]
    linear: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_summary(summary: &ImportSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if !summary.results.is_empty() {
        let rows: Vec<ResultRow> = summary.results.iter().map(result_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for failure in &summary.document_failures {
        println!(
            "{} {}: {}",
            "✗".red().bold(),
            failure.document.display(),
            failure.message
        );
    }

    println!(
        "{prefix}{} stories: {} created, {} updated, {} failed, {} skipped",
        summary.total,
        summary.created.to_string().green(),
        summary.updated.to_string().cyan(),
        summary.failed.to_string().red(),
        summary.skipped.to_string().bright_black(),
    );
}

fn result_row(result: &ImportResult) -> ResultRow {
    let detail = match &result.message {
        Some(message) => message.clone(),
        None => result.warnings.join("; "),
    };
    ResultRow {
        document: short_name(&result.document),
        story: result.title.clone(),
        action: action_label(result.action),
        linear: result.linear_url.clone().unwrap_or_default(),
        detail,
    }
}

fn action_label(action: ImportAction) -> String {
    let label = action.to_string();
    match action {
        ImportAction::Created => label.green().bold().to_string(),
        ImportAction::Updated => label.cyan().bold().to_string(),
        ImportAction::Failed => label.red().bold().to_string(),
        ImportAction::Skipped => label.bright_black().to_string(),
    }
}
