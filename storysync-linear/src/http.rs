//! GraphQL-over-HTTPS implementation of [`LinearClient`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::client::{
    Connection, IssueInput, IssuePage, IssuePayload, LinearClient, NamedNode, UserNode, UserQuery,
};
use crate::error::ClientError;

/// Linear GraphQL endpoint.
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Upper bound on a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ISSUE_FIELDS: &str = r#"
    id
    identifier
    url
    title
    description
    priority
    estimate
    state { id name }
    assignee { id name email }
    labels { nodes { id name } }
    project { id name }
    team { id name key }
"#;

// Every operation aliases its root field to `result` so one envelope type
// decodes them all.

const TEAMS_QUERY: &str = r#"
query Teams($name: String!) {
  result: teams(filter: { or: [{ name: { eqIgnoreCase: $name } }, { key: { eq: $name } }] }) {
    nodes { id name }
  }
}"#;

const PROJECTS_QUERY: &str = r#"
query Projects($teamId: ID!, $name: String!) {
  result: projects(filter: {
    name: { eqIgnoreCase: $name }
    accessibleTeams: { some: { id: { eq: $teamId } } }
  }) {
    nodes { id name }
  }
}"#;

const LABELS_QUERY: &str = r#"
query Labels($name: String!) {
  result: issueLabels(filter: { name: { eqIgnoreCase: $name } }) {
    nodes { id name }
  }
}"#;

const USERS_QUERY: &str = r#"
query Users($filter: UserFilter!) {
  result: users(filter: $filter) {
    nodes { id name email }
  }
}"#;

const STATES_QUERY: &str = r#"
query States($teamId: ID!, $name: String!) {
  result: workflowStates(filter: {
    team: { id: { eq: $teamId } }
    name: { eqIgnoreCase: $name }
  }) {
    nodes { id name }
  }
}"#;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct Aliased<T> {
    result: T,
}

/// Linear API client authenticated with a personal API key.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

/// API errors first, even when `data` is present alongside them; then the
/// aliased `result` decoded as `T`.
fn decode_result<T: DeserializeOwned>(
    body: GraphqlResponse<Aliased<Option<Value>>>,
) -> Result<T, ClientError> {
    if !body.errors.is_empty() {
        let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
        return Err(ClientError::Api(messages.join("; ")));
    }
    let result = body
        .data
        .and_then(|data| data.result)
        .ok_or_else(|| ClientError::Decode("response has neither data nor errors".to_string()))?;
    serde_json::from_value(result)
        .map_err(|e| ClientError::Decode(format!("unexpected response shape: {e}")))
}

impl HttpClient {
    /// Create a client for the public Linear endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_endpoint(api_key, LINEAR_API_URL)
    }

    /// Create a client for a custom endpoint (proxies, staging).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("storysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let request = GraphqlRequest { query, variables };
        trace!(query, "sending GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "Linear API returned {status}: {}",
                text.trim()
            )));
        }

        let body: GraphqlResponse<Aliased<Option<Value>>> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to parse response: {e}")))?;
        decode_result(body)
    }

    async fn lookup(&self, query: &str, variables: Value) -> Result<Vec<NamedNode>, ClientError> {
        let connection: Connection<NamedNode> = self.execute(query, variables).await?;
        Ok(connection.nodes)
    }
}

fn issue_mutation(name: &str, header: &str, args: &str) -> String {
    format!(
        "mutation {name}({header}) {{\n  result: {field}({args}) {{\n    success\n    issue {{ {ISSUE_FIELDS} }}\n  }}\n}}",
        field = if name == "CreateIssue" { "issueCreate" } else { "issueUpdate" },
    )
}

fn issues_query() -> String {
    format!(
        "query Issues($filter: IssueFilter, $first: Int!, $after: String) {{\n  result: issues(filter: $filter, first: $first, after: $after) {{\n    nodes {{ {ISSUE_FIELDS} }}\n    pageInfo {{ hasNextPage endCursor }}\n  }}\n}}"
    )
}

/// `UserFilter` for a [`UserQuery`].
pub(crate) fn user_filter(query: &UserQuery) -> Value {
    match query {
        UserQuery::Email(email) => json!({ "email": { "eq": email } }),
        UserQuery::Name(name) => json!({
            "or": [
                { "name": { "eqIgnoreCase": name } },
                { "displayName": { "eqIgnoreCase": name } }
            ]
        }),
        UserQuery::Me => json!({ "isMe": { "eq": true } }),
    }
}

#[async_trait]
impl LinearClient for HttpClient {
    async fn create_issue(&self, input: &IssueInput) -> Result<IssuePayload, ClientError> {
        debug!(title = %input.title, "issueCreate");
        let query = issue_mutation("CreateIssue", "$input: IssueCreateInput!", "input: $input");
        self.execute(&query, json!({ "input": input })).await
    }

    async fn update_issue(
        &self,
        id: &str,
        input: &IssueInput,
    ) -> Result<IssuePayload, ClientError> {
        debug!(id, title = %input.title, "issueUpdate");
        let query = issue_mutation(
            "UpdateIssue",
            "$id: String!, $input: IssueUpdateInput!",
            "id: $id, input: $input",
        );
        self.execute(&query, json!({ "id": id, "input": input })).await
    }

    async fn issues(
        &self,
        filter: &Value,
        first: u32,
        after: Option<&str>,
    ) -> Result<IssuePage, ClientError> {
        debug!(first, after, "issues page");
        self.execute(
            &issues_query(),
            json!({ "filter": filter, "first": first, "after": after }),
        )
        .await
    }

    async fn teams(&self, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        self.lookup(TEAMS_QUERY, json!({ "name": name })).await
    }

    async fn projects(&self, team_id: &str, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        self.lookup(PROJECTS_QUERY, json!({ "teamId": team_id, "name": name }))
            .await
    }

    async fn labels(&self, name: &str) -> Result<Vec<NamedNode>, ClientError> {
        self.lookup(LABELS_QUERY, json!({ "name": name })).await
    }

    async fn users(&self, query: &UserQuery) -> Result<Vec<UserNode>, ClientError> {
        let connection: Connection<UserNode> = self
            .execute(USERS_QUERY, json!({ "filter": user_filter(query) }))
            .await?;
        Ok(connection.nodes)
    }

    async fn workflow_states(
        &self,
        team_id: &str,
        name: &str,
    ) -> Result<Vec<NamedNode>, ClientError> {
        self.lookup(STATES_QUERY, json!({ "teamId": team_id, "name": name }))
            .await
    }
}
