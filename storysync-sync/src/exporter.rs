//! Linear issues → one story document.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use storysync_core::{serialize_document, Config, Frontmatter, Story};
use storysync_linear::{
    build_issue_filter, is_identifier, ExportFilter, Gateway, LinearClient, RemoteIssue, Resolver,
};

use crate::error::SyncError;
use crate::store::DocumentStore;

/// Inputs for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub config: Config,
    pub filters: ExportFilter,
    /// Team used when `filters.team` is empty, ahead of `default_team`.
    pub team_override: Option<String>,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub count: usize,
    pub output_path: PathBuf,
}

/// Fetch every matching issue and write them as a story document.
///
/// The file is written even when nothing matches.
pub async fn export_records(
    client: &dyn LinearClient,
    store: &dyn DocumentStore,
    options: &ExportOptions,
) -> Result<ExportOutcome, SyncError> {
    let mut filters = options.filters.clone();
    filters.team = filters
        .team
        .or_else(|| options.team_override.clone())
        .or_else(|| options.config.default_team.clone());
    filters.project = filters
        .project
        .or_else(|| options.config.default_project.clone());

    let frontmatter = Frontmatter {
        project: filters.project.clone(),
        team: filters.team.clone(),
    };

    let resolved = match (&filters.team, &filters.project) {
        (Some(team), Some(project)) if !is_identifier(project) => {
            Some(resolve_project(client, team, project).await)
        }
        _ => None,
    };
    if resolved.is_some() {
        filters.project = resolved;
    }

    let filter = build_issue_filter(&filters);
    debug!(%filter, "exporting issues");
    let mut issues = Gateway::new(client).fetch_all(&filter).await?;
    disambiguate_titles(&mut issues);
    let stories: Vec<Story> = issues.into_iter().map(issue_to_story).collect();

    let text = serialize_document(&stories, Some(&frontmatter));
    store.write_text(&options.output_path, &text).await?;
    info!(
        count = stories.len(),
        path = %options.output_path.display(),
        "exported issues"
    );

    Ok(ExportOutcome {
        count: stories.len(),
        output_path: options.output_path.clone(),
    })
}

/// Project id for the filter, or the name unchanged if it does not resolve.
async fn resolve_project(client: &dyn LinearClient, team: &str, project: &str) -> String {
    let mut resolver = Resolver::new(client);
    let resolved = match resolver.team(team).await {
        Ok(team_id) => resolver.project(&team_id, project).await,
        Err(err) => Err(err),
    };
    match resolved {
        Ok(id) => id,
        Err(err) => {
            debug!(project, error = %err, "filtering by project name");
            project.to_string()
        }
    }
}

/// Give every issue a title the document parser accepts: blank titles and
/// titles shared by several issues get the issue identifier appended, and
/// any remaining clash a counter.
fn disambiguate_titles(issues: &mut [RemoteIssue]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for issue in issues.iter() {
        *counts.entry(issue.title.trim().to_string()).or_default() += 1;
    }

    let mut seen = HashSet::new();
    for issue in issues.iter_mut() {
        let title = issue.title.trim();
        let tag = if issue.identifier.is_empty() {
            &issue.id
        } else {
            &issue.identifier
        };
        let mut unique = match (title.is_empty(), counts.get(title).copied().unwrap_or(0) > 1) {
            (true, _) => tag.clone(),
            (false, true) => format!("{title} ({tag})"),
            (false, false) => title.to_string(),
        };
        let base = unique.clone();
        let mut n = 2;
        while !seen.insert(unique.clone()) {
            unique = format!("{base} ({n})");
            n += 1;
        }
        if unique != issue.title {
            warn!(
                id = %issue.id,
                from = %issue.title,
                to = %unique,
                "renamed exported story to keep titles unique"
            );
            issue.title = unique;
        }
    }
}

/// Direct field mapping; the issue's description becomes the body.
pub fn issue_to_story(issue: RemoteIssue) -> Story {
    Story {
        title: issue.title,
        linear_id: Some(issue.id),
        linear_url: Some(issue.url),
        priority: issue.priority,
        labels: issue.labels,
        estimate: issue.estimate,
        assignee: issue.assignee,
        status: issue.state,
        body: issue.description.unwrap_or_default(),
        project: issue.project,
        team: issue.team,
    }
}
