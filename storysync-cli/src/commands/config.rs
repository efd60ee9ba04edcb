//! `storysync config show` and `storysync config set`

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use storysync_core::config::{self, Config, API_KEY_ENV};

/// Inspect or edit `~/.storysync/config.yaml`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (API key masked).
    Show {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Change one or more settings.
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Linear personal API key.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Default team name, key, or id.
    #[arg(long)]
    pub team: Option<String>,

    /// Default project name or id.
    #[arg(long)]
    pub project: Option<String>,

    /// Labels added to every imported story, comma separated. Empty clears.
    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show(json),
        ConfigCommand::Set(args) => set(args),
    }
}

fn show(json: bool) -> Result<()> {
    let config = config::load().context("failed to load config")?.redacted();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("failed to serialize config")?
        );
        return Ok(());
    }

    let home = dirs::home_dir().context("could not determine home directory")?;
    println!("{}", config::config_path_at(&home).display());
    println!("api_key:         {}", config.api_key.as_deref().unwrap_or("(not set)"));
    println!("default_team:    {}", config.default_team.as_deref().unwrap_or("-"));
    println!("default_project: {}", config.default_project.as_deref().unwrap_or("-"));
    println!("default_labels:  {}", config.default_labels.join(", "));
    if std::env::var(API_KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        println!("(api_key from {API_KEY_ENV})");
    }
    Ok(())
}

fn set(args: SetArgs) -> Result<()> {
    if args.api_key.is_none()
        && args.team.is_none()
        && args.project.is_none()
        && args.labels.is_none()
    {
        bail!("nothing to set; pass --api-key, --team, --project, or --labels");
    }

    let home = dirs::home_dir().context("could not determine home directory")?;
    // The file alone: an API key from the environment is never persisted.
    let mut config: Config = config::load_at(&home).context("failed to load config")?;
    if let Some(key) = args.api_key {
        config.api_key = non_empty(key);
    }
    if let Some(team) = args.team {
        config.default_team = non_empty(team);
    }
    if let Some(project) = args.project {
        config.default_project = non_empty(project);
    }
    if let Some(labels) = args.labels {
        config.default_labels = labels
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
    }

    let path = config::save_at(&home, &config).context("failed to save config")?;
    println!("✓ Saved {}", path.display());
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
