//! `storysync check`: parse story documents, no network.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use storysync_core::{parse_document, Story};

use super::{expand_paths, short_name};

/// Arguments for `storysync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Story documents, or directories containing `*.md` documents.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CheckedDocument {
    document: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    stories: Vec<Story>,
}

#[derive(Tabled)]
struct StoryRow {
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "story")]
    story: String,
    #[tabled(rename = "team")]
    team: String,
    #[tabled(rename = "linear id")]
    linear_id: String,
    #[tabled(rename = "labels")]
    labels: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let mut checked = Vec::new();
        for path in expand_paths(&self.paths)? {
            let result = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))
                .and_then(|text| {
                    parse_document(&text, &path.display().to_string()).map_err(Into::into)
                });
            checked.push(match result {
                Ok(document) => CheckedDocument {
                    document: path,
                    error: None,
                    stories: document.stories,
                },
                Err(err) => CheckedDocument {
                    document: path,
                    error: Some(format!("{err:#}")),
                    stories: Vec::new(),
                },
            });
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&checked).context("failed to serialize documents")?
            );
        } else {
            print_table(&checked);
        }

        let errors = checked.iter().filter(|c| c.error.is_some()).count();
        if errors > 0 {
            bail!("{errors} document(s) could not be parsed");
        }
        Ok(())
    }
}

fn print_table(checked: &[CheckedDocument]) {
    let rows: Vec<StoryRow> = checked
        .iter()
        .flat_map(|doc| {
            doc.stories.iter().map(|story| StoryRow {
                document: short_name(&doc.document),
                story: story.title.clone(),
                team: story.team.clone().unwrap_or_default(),
                linear_id: story
                    .linear_id
                    .clone()
                    .unwrap_or_else(|| "-".bright_black().to_string()),
                labels: story.labels.join(", "),
            })
        })
        .collect();
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for doc in checked {
        match &doc.error {
            Some(error) => println!("{} {}", "✗".red().bold(), error),
            None => println!(
                "{} {} ({} stories)",
                "✓".green().bold(),
                doc.document.display(),
                doc.stories.len()
            ),
        }
    }
}
