//! Story documents → Linear issues.
//!
//! Documents are processed in the order given, stories in document order.
//! A failure inside one story becomes a `failed` result for that story; a
//! document that cannot be read or parsed becomes a [`DocumentFailure`].
//! Neither stops the run.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use storysync_core::{
    apply_writeback, parse_document, Config, DocumentFailure, ImportAction, ImportResult,
    ImportSummary, LinearLink, Story,
};
use storysync_linear::{Gateway, IssueInput, LinearClient, Resolver};

use crate::error::SyncError;
use crate::store::DocumentStore;

/// Valid Linear priorities: 0 (none) through 4 (low).
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i64> = 0..=4;

/// Inputs for one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub document_paths: Vec<PathBuf>,
    pub config: Config,
    /// Used when a story (and its frontmatter) names no team.
    pub team_override: Option<String>,
    /// Used when a story (and its frontmatter) names no project.
    pub project_override: Option<String>,
    /// Parse only: every story is `skipped`, nothing remote, nothing written.
    pub dry_run: bool,
    /// Create and update as usual but never rewrite the documents.
    pub skip_write_back: bool,
}

/// A story that made it to Linear.
struct Imported {
    action: ImportAction,
    link: LinearLink,
    warnings: Vec<String>,
}

/// Import every document in `options.document_paths`.
pub async fn import_documents(
    client: &dyn LinearClient,
    store: &dyn DocumentStore,
    options: &ImportOptions,
) -> ImportSummary {
    let gateway = Gateway::new(client);
    let mut resolver = Resolver::new(client);
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for path in &options.document_paths {
        let text = match store.read_text(path).await {
            Ok(text) => text,
            Err(err) => {
                warn!(document = %path.display(), error = %err, "could not read document");
                failures.push(document_failure(path, &err));
                continue;
            }
        };
        let document = match parse_document(&text, &path.display().to_string()) {
            Ok(document) => document,
            Err(err) => {
                warn!(document = %path.display(), error = %err, "could not parse document");
                failures.push(document_failure(path, &err));
                continue;
            }
        };

        let mut created: HashMap<String, LinearLink> = HashMap::new();
        for story in &document.stories {
            if options.dry_run {
                results.push(ImportResult::skipped(path, story));
                continue;
            }
            let result = match import_story(&gateway, &mut resolver, options, story).await {
                Ok(imported) => ImportResult::succeeded(
                    path,
                    &story.title,
                    imported.action,
                    imported.link,
                    imported.warnings,
                ),
                Err(err) => {
                    warn!(story = %story.title, error = %err, "story import failed");
                    ImportResult::failed(path, &story.title, err.to_string())
                }
            };
            if result.action == ImportAction::Created {
                if let Some(link) = result.link() {
                    created.entry(story.title.clone()).or_insert(link);
                }
            }
            results.push(result);
        }

        if created.is_empty() || options.skip_write_back {
            continue;
        }
        let rewritten = apply_writeback(&text, &created);
        match store.write_text(path, &rewritten).await {
            Ok(()) => info!(
                document = %path.display(),
                stories = created.len(),
                "wrote Linear ids back"
            ),
            Err(err) => {
                warn!(document = %path.display(), error = %err, "write-back failed");
                failures.push(document_failure(path, &err));
            }
        }
    }

    ImportSummary::new(results, failures)
}

async fn import_story(
    gateway: &Gateway<'_>,
    resolver: &mut Resolver<'_>,
    options: &ImportOptions,
    story: &Story,
) -> Result<Imported, SyncError> {
    let priority = validate_priority(story)?;
    let mut warnings = Vec::new();

    let team_name = first_present(&[
        &story.team,
        &options.team_override,
        &options.config.default_team,
    ])
    .ok_or_else(|| SyncError::MissingTeam {
        title: story.title.clone(),
    })?;
    let team_id = resolver.team(team_name).await?;

    let project_id = match first_present(&[
        &story.project,
        &options.project_override,
        &options.config.default_project,
    ]) {
        Some(name) => Some(resolver.project(&team_id, name).await?),
        None => None,
    };

    let labels = resolver
        .labels(&merge_labels(&story.labels, &options.config.default_labels))
        .await;
    warnings.extend(
        labels
            .unresolved
            .iter()
            .map(|name| format!("label '{name}' not found; skipped")),
    );

    let assignee_id = match present(&story.assignee) {
        Some(who) => {
            let id = resolver.assignee(who).await?;
            if id.is_none() {
                warnings.push(format!("assignee '{who}' not found; left unassigned"));
            }
            id
        }
        None => None,
    };

    let state_id = match present(&story.status) {
        Some(status) => {
            let id = resolver.workflow_state(&team_id, status).await?;
            if id.is_none() {
                warnings.push(format!("status '{status}' not found; left as team default"));
            }
            id
        }
        None => None,
    };

    let estimate = story.estimate.map(|estimate| {
        let rounded = estimate.round();
        if rounded != estimate {
            warnings.push(format!("estimate {estimate} rounded to {rounded}"));
        }
        rounded as i64
    });

    let input = IssueInput {
        title: story.title.clone(),
        description: Some(story.body.clone()).filter(|b| !b.trim().is_empty()),
        team_id: Some(team_id),
        project_id,
        priority,
        estimate,
        label_ids: labels.ids,
        assignee_id,
        state_id,
    };

    let (action, issue) = match present(&story.linear_id) {
        Some(id) => (ImportAction::Updated, gateway.update(id, &input).await?),
        None => (ImportAction::Created, gateway.create(&input).await?),
    };
    Ok(Imported {
        action,
        link: LinearLink {
            id: issue.id,
            url: issue.url,
        },
        warnings,
    })
}

fn validate_priority(story: &Story) -> Result<Option<i64>, SyncError> {
    match story.priority {
        Some(p) if !PRIORITY_RANGE.contains(&p) => Err(SyncError::Validation(format!(
            "priority {p} is out of range (expected 0-4)"
        ))),
        other => Ok(other),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates.iter().find_map(|c| present(*c))
}

/// Story labels first, then defaults; later duplicates dropped.
pub fn merge_labels(story: &[String], defaults: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    story
        .iter()
        .chain(defaults)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && seen.insert(l.to_string()))
        .map(str::to_string)
        .collect()
}

fn document_failure(path: &Path, err: &dyn std::fmt::Display) -> DocumentFailure {
    DocumentFailure {
        document: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_merge_in_order_without_duplicates() {
        let story = vec!["auth".to_string(), "web".to_string()];
        let defaults = vec!["imported".to_string(), "auth".to_string()];
        assert_eq!(
            merge_labels(&story, &defaults),
            vec!["auth", "web", "imported"]
        );
        assert!(merge_labels(&[], &[]).is_empty());
    }

    #[test]
    fn priority_bounds() {
        let mut story = Story::new("P");
        story.priority = Some(4);
        assert_eq!(validate_priority(&story).unwrap(), Some(4));
        story.priority = Some(5);
        assert!(matches!(
            validate_priority(&story),
            Err(SyncError::Validation(_))
        ));
        story.priority = Some(-1);
        assert!(validate_priority(&story).is_err());
        story.priority = None;
        assert_eq!(validate_priority(&story).unwrap(), None);
    }

    #[test]
    fn first_present_skips_blank() {
        let blank = Some("  ".to_string());
        let none = None;
        let team = Some("Eng".to_string());
        assert_eq!(first_present(&[&blank, &none, &team]), Some("Eng"));
        assert_eq!(first_present(&[&none]), None);
    }
}
