//! In-memory [`LinearClient`] for tests.
//!
//! Lookups match the way the real API filters do (names case-insensitive,
//! teams also by key). `issues` ignores the filter contents and pages
//! through every stored issue; the filter is kept for inspection via
//! [`MockClient::last_filter`].

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{
    Connection, IssueInput, IssueNode, IssuePage, IssuePayload, LinearClient, NamedNode, PageInfo,
    TeamNode, UserNode, UserQuery,
};
use crate::error::ClientError;

/// Canonical id of the `n`th issue created by a [`MockClient`] (1-based).
pub fn mock_issue_id(n: usize) -> String {
    format!("00000000-0000-4000-8000-{n:012}")
}

#[derive(Default)]
struct State {
    teams: Vec<TeamNode>,
    projects: Vec<(String, NamedNode)>,
    labels: Vec<NamedNode>,
    users: Vec<(UserNode, bool)>,
    states: Vec<(String, NamedNode)>,
    issues: Vec<IssueNode>,
    fail_create: HashSet<String>,
    reject_create: HashSet<String>,
    failing_ops: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    created: Vec<IssueInput>,
    updated: Vec<(String, IssueInput)>,
    last_filter: Option<Value>,
}

/// Scriptable fake Linear workspace.
#[derive(Default)]
pub struct MockClient {
    state: Mutex<State>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn edit(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.lock());
        self
    }

    // -- workspace contents --------------------------------------------------

    pub fn with_team(self, id: &str, name: &str, key: &str) -> Self {
        self.edit(|s| {
            s.teams.push(TeamNode {
                id: id.to_string(),
                name: name.to_string(),
                key: Some(key.to_string()),
            })
        })
    }

    pub fn with_project(self, id: &str, team_id: &str, name: &str) -> Self {
        self.edit(|s| s.projects.push((team_id.to_string(), named(id, name))))
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.edit(|s| s.labels.push(named(id, name)))
    }

    pub fn with_user(self, id: &str, name: &str, email: &str) -> Self {
        self.edit(|s| s.users.push((user(id, name, email), false)))
    }

    /// The user the API key belongs to (`me`).
    pub fn with_viewer(self, id: &str, name: &str, email: &str) -> Self {
        self.edit(|s| s.users.push((user(id, name, email), true)))
    }

    pub fn with_state(self, id: &str, team_id: &str, name: &str) -> Self {
        self.edit(|s| s.states.push((team_id.to_string(), named(id, name))))
    }

    /// Store an issue under the next generated id.
    pub fn with_issue(self, title: &str) -> Self {
        self.edit(|s| {
            let n = s.issues.len() + 1;
            s.issues.push(issue_node(mock_issue_id(n), n, title));
        })
    }

    /// Store a fully specified issue.
    pub fn with_issue_node(self, node: IssueNode) -> Self {
        self.edit(|s| s.issues.push(node))
    }

    // -- failure injection ---------------------------------------------------

    /// `create_issue` for `title` fails with a transport error.
    pub fn fail_create_for(self, title: &str) -> Self {
        self.edit(|s| {
            s.fail_create.insert(title.to_string());
        })
    }

    /// `create_issue` for `title` answers `success: false`.
    pub fn reject_create_for(self, title: &str) -> Self {
        self.edit(|s| {
            s.reject_create.insert(title.to_string());
        })
    }

    /// Every call to `operation` fails with a transport error.
    pub fn fail_operation(self, operation: &'static str) -> Self {
        self.edit(|s| {
            s.failing_ops.insert(operation);
        })
    }

    // -- inspection ----------------------------------------------------------

    /// Number of calls made to `operation` (trait method name).
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Inputs passed to `create_issue`, in call order.
    pub fn created(&self) -> Vec<IssueInput> {
        self.lock().created.clone()
    }

    /// `(id, input)` pairs passed to `update_issue`, in call order.
    pub fn updated(&self) -> Vec<(String, IssueInput)> {
        self.lock().updated.clone()
    }

    pub fn last_filter(&self) -> Option<Value> {
        self.lock().last_filter.clone()
    }

    fn record(&self, operation: &'static str) -> Result<MutexGuard<'_, State>, ClientError> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;
        if state.failing_ops.contains(operation) {
            return Err(ClientError::Transport(format!(
                "{operation}: connection reset"
            )));
        }
        Ok(state)
    }
}

fn named(id: &str, name: &str) -> NamedNode {
    NamedNode {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn user(id: &str, name: &str, email: &str) -> UserNode {
    UserNode {
        id: id.to_string(),
        name: name.to_string(),
        email: Some(email.to_string()),
    }
}

fn issue_node(id: String, n: usize, title: &str) -> IssueNode {
    let identifier = format!("ENG-{n}");
    IssueNode {
        id,
        url: format!("https://linear.app/mock/issue/{identifier}"),
        identifier,
        title: title.to_string(),
        ..IssueNode::default()
    }
}

fn apply_input(state: &State, node: &mut IssueNode, input: &IssueInput) {
    node.title = input.title.clone();
    if input.description.is_some() {
        node.description = input.description.clone();
    }
    if let Some(priority) = input.priority {
        node.priority = Some(priority as f64);
    }
    if let Some(estimate) = input.estimate {
        node.estimate = Some(estimate as f64);
    }
    if let Some(team_id) = &input.team_id {
        node.team = state.teams.iter().find(|t| &t.id == team_id).cloned();
    }
    if let Some(project_id) = &input.project_id {
        node.project = state
            .projects
            .iter()
            .map(|(_, p)| p)
            .find(|p| &p.id == project_id)
            .cloned();
    }
    if let Some(state_id) = &input.state_id {
        node.state = state
            .states
            .iter()
            .map(|(_, s)| s)
            .find(|s| &s.id == state_id)
            .cloned();
    }
    if let Some(assignee_id) = &input.assignee_id {
        node.assignee = state
            .users
            .iter()
            .map(|(u, _)| u)
            .find(|u| &u.id == assignee_id)
            .cloned();
    }
    if !input.label_ids.is_empty() {
        let nodes = state
            .labels
            .iter()
            .filter(|l| input.label_ids.contains(&l.id))
            .cloned()
            .collect();
        node.labels = Some(Connection { nodes });
    }
}

#[async_trait]
impl LinearClient for MockClient {
    async fn create_issue(&self, input: &IssueInput) -> Result<IssuePayload, ClientError> {
        let mut state = self.record("create_issue")?;
        if state.fail_create.contains(&input.title) {
            return Err(ClientError::Transport(format!(
                "create '{}' failed: connection reset",
                input.title
            )));
        }
        if state.reject_create.contains(&input.title) {
            return Ok(IssuePayload {
                success: false,
                issue: None,
            });
        }
        state.created.push(input.clone());
        let n = state.issues.len() + 1;
        let mut node = issue_node(mock_issue_id(n), n, &input.title);
        apply_input(&state, &mut node, input);
        state.issues.push(node.clone());
        Ok(IssuePayload {
            success: true,
            issue: Some(node),
        })
    }

    async fn update_issue(
        &self,
        id: &str,
        input: &IssueInput,
    ) -> Result<IssuePayload, ClientError> {
        let mut state = self.record("update_issue")?;
        state.updated.push((id.to_string(), input.clone()));
        let Some(index) = state.issues.iter().position(|i| i.id == id) else {
            return Err(ClientError::Api(format!("Entity not found: Issue {id}")));
        };
        let mut node = state.issues[index].clone();
        apply_input(&state, &mut node, input);
        state.issues[index] = node.clone();
        Ok(IssuePayload {
            success: true,
            issue: Some(node),
        })
    }

    async fn issues(
        &self,
        filter: &Value,
        first: u32,
        after: Option<&str>,
    ) -> Result<IssuePage, ClientError> {
        let mut state = self.record("issues")?;
        state.last_filter = Some(filter.clone());
        let start = match after {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| ClientError::Api(format!("invalid cursor '{cursor}'")))?,
            None => 0,
        };
        let end = (start + first as usize).min(state.issues.len());
        let nodes = state.issues.get(start..end).unwrap_or_default().to_vec();
        Ok(IssuePage {
            nodes,
            page_info: PageInfo {
                has_next_page: end < state.issues.len(),
                end_cursor: Some(end.to_string()),
            },
        })
    }

    async fn teams(&self, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        let state = self.record("teams")?;
        Ok(state
            .teams
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case(name) || t.key.as_deref() == Some(name))
            .map(|t| named(&t.id, &t.name))
            .collect())
    }

    async fn projects(&self, team_id: &str, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        let state = self.record("projects")?;
        Ok(state
            .projects
            .iter()
            .filter(|(team, p)| team == team_id && p.name.eq_ignore_ascii_case(name))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn labels(&self, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        let state = self.record("labels")?;
        Ok(state
            .labels
            .iter()
            .filter(|l| l.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    async fn users(&self, query: &UserQuery) -> Result<Vec<UserNode>, ClientError> {
        let state = self.record("users")?;
        Ok(state
            .users
            .iter()
            .filter(|(u, is_me)| match query {
                UserQuery::Email(email) => u
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email)),
                UserQuery::Name(name) => u.name.eq_ignore_ascii_case(name),
                UserQuery::Me => *is_me,
            })
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn workflow_states(
        &self,
        team_id: &str,
        name: &str,
    ) -> Result<Vec<NamedNode>, ClientError> {
        let state = self.record("workflow_states")?;
        Ok(state
            .states
            .iter()
            .filter(|(team, s)| team == team_id && s.name.eq_ignore_ascii_case(name))
            .map(|(_, s)| s.clone())
            .collect())
    }
}
