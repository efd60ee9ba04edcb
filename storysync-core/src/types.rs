//! Domain types shared by the document engine and the sync orchestrator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Document-level defaults inherited by every story that omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.team.is_none()
    }
}

/// One work item, parsed from or serialized to one `## ` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    /// `None` until the story exists remotely; presence means "update".
    pub linear_id: Option<String>,
    pub linear_url: Option<String>,
    pub priority: Option<i64>,
    pub labels: Vec<String>,
    pub estimate: Option<f64>,
    pub assignee: Option<String>,
    pub status: Option<String>,
    pub body: String,
    pub project: Option<String>,
    pub team: Option<String>,
}

impl Story {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// True when at least one field of the metadata block would be emitted.
    pub fn has_metadata(&self) -> bool {
        self.linear_id.is_some()
            || self.linear_url.is_some()
            || self.priority.is_some()
            || !self.labels.is_empty()
            || self.estimate.is_some()
            || self.assignee.is_some()
            || self.status.is_some()
    }
}

/// A parsed document: frontmatter plus stories in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryDocument {
    pub frontmatter: Frontmatter,
    pub stories: Vec<Story>,
}

/// Identifier and locator assigned to a story by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearLink {
    pub id: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Import results
// ---------------------------------------------------------------------------

/// What happened to one story during an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    Updated,
    Failed,
    Skipped,
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportAction::Created => write!(f, "created"),
            ImportAction::Updated => write!(f, "updated"),
            ImportAction::Failed => write!(f, "failed"),
            ImportAction::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-story outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    pub document: PathBuf,
    pub title: String,
    pub action: ImportAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_url: Option<String>,
    /// Failure text for `Failed`; `None` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Non-fatal diagnostics, e.g. labels that did not resolve.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ImportResult {
    pub fn succeeded(
        document: impl Into<PathBuf>,
        title: impl Into<String>,
        action: ImportAction,
        link: LinearLink,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            document: document.into(),
            title: title.into(),
            action,
            linear_id: Some(link.id),
            linear_url: Some(link.url),
            message: None,
            warnings,
        }
    }

    pub fn failed(
        document: impl Into<PathBuf>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            title: title.into(),
            action: ImportAction::Failed,
            linear_id: None,
            linear_url: None,
            message: Some(message.into()),
            warnings: Vec::new(),
        }
    }

    pub fn skipped(document: impl Into<PathBuf>, story: &Story) -> Self {
        Self {
            document: document.into(),
            title: story.title.clone(),
            action: ImportAction::Skipped,
            linear_id: story.linear_id.clone(),
            linear_url: story.linear_url.clone(),
            message: None,
            warnings: Vec::new(),
        }
    }

    /// The assigned link, when the story reached the remote service.
    pub fn link(&self) -> Option<LinearLink> {
        match (&self.linear_id, &self.linear_url) {
            (Some(id), Some(url)) => Some(LinearLink {
                id: id.clone(),
                url: url.clone(),
            }),
            _ => None,
        }
    }
}

/// A document that could not be processed as a whole (unreadable,
/// unparseable, or write-back could not be persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub document: PathBuf,
    pub message: String,
}

/// Aggregate view over every per-story result of one import run.
///
/// Counts are derived from `results` at construction and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<ImportResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub document_failures: Vec<DocumentFailure>,
}

impl ImportSummary {
    pub fn new(results: Vec<ImportResult>, document_failures: Vec<DocumentFailure>) -> Self {
        let count = |action: ImportAction| results.iter().filter(|r| r.action == action).count();
        Self {
            total: results.len(),
            created: count(ImportAction::Created),
            updated: count(ImportAction::Updated),
            failed: count(ImportAction::Failed),
            skipped: count(ImportAction::Skipped),
            document_failures,
            results,
        }
    }

    /// True when every story and every document went through.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.document_failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
