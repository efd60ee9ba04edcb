//! Remote record gateway: create, update, and paginated fetch of issues.
//!
//! Everything past this boundary sees [`RemoteIssue`] and [`GatewayError`];
//! nested API payloads and the three client error kinds stop here.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{IssueInput, IssueNode, IssuePayload, LinearClient};
use crate::error::GatewayError;

/// Issues requested per `issues` page.
pub const PAGE_SIZE: u32 = 50;

/// A remote issue with nested sub-objects flattened to names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteIssue {
    pub id: String,
    pub identifier: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub estimate: Option<f64>,
    pub state: Option<String>,
    /// Email when the API exposes one, else the display name.
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub project: Option<String>,
    pub team: Option<String>,
}

impl From<IssueNode> for RemoteIssue {
    fn from(node: IssueNode) -> Self {
        RemoteIssue {
            id: node.id,
            identifier: node.identifier,
            url: node.url,
            title: node.title,
            description: node.description.filter(|d| !d.trim().is_empty()),
            priority: node.priority.map(|p| p.round() as i64),
            estimate: node.estimate,
            state: node.state.map(|s| s.name),
            assignee: node.assignee.map(|u| u.email.unwrap_or(u.name)),
            labels: node
                .labels
                .map(|c| c.nodes.into_iter().map(|l| l.name).collect())
                .unwrap_or_default(),
            project: node.project.map(|p| p.name),
            team: node.team.map(|t| t.name),
        }
    }
}

/// Thin typed wrapper over a [`LinearClient`].
pub struct Gateway<'c> {
    client: &'c dyn LinearClient,
}

impl<'c> Gateway<'c> {
    pub fn new(client: &'c dyn LinearClient) -> Self {
        Self { client }
    }

    /// Create an issue; a rejected mutation is an error like any other.
    pub async fn create(&self, input: &IssueInput) -> Result<RemoteIssue, GatewayError> {
        let payload = self.client.create_issue(input).await?;
        let issue = accepted("issueCreate", &input.title, payload)?;
        info!(identifier = %issue.identifier, title = %issue.title, "created issue");
        Ok(issue)
    }

    /// Update issue `id` with the fields present in `input`.
    pub async fn update(&self, id: &str, input: &IssueInput) -> Result<RemoteIssue, GatewayError> {
        let payload = self.client.update_issue(id, input).await?;
        let issue = accepted("issueUpdate", &input.title, payload)?;
        info!(identifier = %issue.identifier, title = %issue.title, "updated issue");
        Ok(issue)
    }

    /// Every issue matching `filter`, following cursors to the last page.
    pub async fn fetch_all(&self, filter: &Value) -> Result<Vec<RemoteIssue>, GatewayError> {
        let mut issues = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .client
                .issues(filter, PAGE_SIZE, cursor.as_deref())
                .await?;
            debug!(count = page.nodes.len(), "fetched issue page");
            issues.extend(page.nodes.into_iter().map(RemoteIssue::from));

            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        return Err(GatewayError::Remote(format!(
                            "pagination cursor '{next}' did not advance"
                        )));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        Ok(issues)
    }
}

fn accepted(
    operation: &str,
    title: &str,
    payload: IssuePayload,
) -> Result<RemoteIssue, GatewayError> {
    if !payload.success {
        return Err(GatewayError::Remote(format!(
            "{operation} rejected for '{title}'"
        )));
    }
    payload.issue.map(RemoteIssue::from).ok_or_else(|| {
        GatewayError::Remote(format!("{operation} for '{title}' returned no issue"))
    })
}
