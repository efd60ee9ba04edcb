//! Remote client seam and the Linear wire types it speaks.
//!
//! [`LinearClient`] is one method per remote operation; every method
//! returns decoded, typed payloads. The production implementation is
//! [`crate::HttpClient`]; tests use `MockClient` (feature `mock`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// `IssueCreateInput` / `IssueUpdateInput`. Absent fields are omitted so
/// an update never clears what the document does not mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// Condition for the `users` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    Email(String),
    /// Matches `name` or `displayName`, case-insensitively.
    Name(String),
    /// The viewer the API key belongs to.
    Me,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Any `{ id name }` node: team, project, label, workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TeamNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of `issues`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    pub nodes: Vec<IssueNode>,
    pub page_info: PageInfo,
}

/// An issue as the API returns it, with nested sub-objects.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub id: String,
    pub identifier: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub state: Option<NamedNode>,
    #[serde(default)]
    pub assignee: Option<UserNode>,
    #[serde(default)]
    pub labels: Option<Connection<NamedNode>>,
    #[serde(default)]
    pub project: Option<NamedNode>,
    #[serde(default)]
    pub team: Option<TeamNode>,
}

/// `issueCreate` / `issueUpdate` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssuePayload {
    pub success: bool,
    #[serde(default)]
    pub issue: Option<IssueNode>,
}

// ---------------------------------------------------------------------------
// Client seam
// ---------------------------------------------------------------------------

/// Every remote operation the sync engine needs.
///
/// Lookups return all candidates in API order; callers pick.
#[async_trait]
pub trait LinearClient: Send + Sync {
    async fn create_issue(&self, input: &IssueInput) -> Result<IssuePayload, ClientError>;

    async fn update_issue(&self, id: &str, input: &IssueInput)
        -> Result<IssuePayload, ClientError>;

    /// One page of issues matching `filter` (an `IssueFilter` object).
    async fn issues(
        &self,
        filter: &Value,
        first: u32,
        after: Option<&str>,
    ) -> Result<IssuePage, ClientError>;

    /// Teams whose name (case-insensitive) or key equals `name`.
    async fn teams(&self, name: &str) -> Result<Vec<NamedNode>, ClientError>;

    /// Projects named `name` that `team_id` can access.
    async fn projects(&self, team_id: &str, name: &str) -> Result<Vec<NamedNode>, ClientError>;

    async fn labels(&self, name: &str) -> Result<Vec<NamedNode>, ClientError>;

    async fn users(&self, query: &UserQuery) -> Result<Vec<UserNode>, ClientError>;

    /// Workflow states of `team_id` named `name` (case-insensitive).
    async fn workflow_states(
        &self,
        team_id: &str,
        name: &str,
    ) -> Result<Vec<NamedNode>, ClientError>;
}
