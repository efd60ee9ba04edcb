//! Export filter → GraphQL `IssueFilter`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::resolver::is_identifier;

/// What to export. Every field is optional; an empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    pub team: Option<String>,
    pub project: Option<String>,
    /// Issue ids or human identifiers such as `ENG-123`.
    #[serde(default)]
    pub identifiers: Vec<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub creator: Option<String>,
}

/// Build the `IssueFilter` object for `filter`.
pub fn build_issue_filter(filter: &ExportFilter) -> Value {
    let mut conditions = Map::new();

    if let Some(team) = present(&filter.team) {
        let condition = if is_identifier(team) {
            json!({ "id": { "eq": team } })
        } else {
            json!({ "or": [
                { "name": { "eqIgnoreCase": team } },
                { "key": { "eq": team } }
            ] })
        };
        conditions.insert("team".to_string(), condition);
    }

    if let Some(project) = present(&filter.project) {
        let condition = if is_identifier(project) {
            json!({ "id": { "eq": project } })
        } else {
            json!({ "name": { "eqIgnoreCase": project } })
        };
        conditions.insert("project".to_string(), condition);
    }

    let mut ids = Vec::new();
    let mut numbered = Vec::new();
    for raw in &filter.identifiers {
        let raw = raw.trim();
        if is_identifier(raw) {
            ids.push(raw.to_string());
        } else if let Some((key, number)) = split_identifier(raw) {
            numbered.push(json!({
                "team": { "key": { "eq": key } },
                "number": { "eq": number }
            }));
        } else if !raw.is_empty() {
            warn!(identifier = raw, "not an issue id or KEY-123 identifier, ignoring");
        }
    }
    if numbered.is_empty() {
        if !ids.is_empty() {
            conditions.insert("id".to_string(), json!({ "in": ids }));
        }
    } else {
        if !ids.is_empty() {
            numbered.push(json!({ "id": { "in": ids } }));
        }
        conditions.insert("or".to_string(), Value::Array(numbered));
    }

    if let Some(status) = present(&filter.status) {
        conditions.insert(
            "state".to_string(),
            json!({ "name": { "eqIgnoreCase": status } }),
        );
    }
    if let Some(assignee) = present(&filter.assignee) {
        conditions.insert("assignee".to_string(), user_condition(assignee));
    }
    if let Some(creator) = present(&filter.creator) {
        conditions.insert("creator".to_string(), user_condition(creator));
    }

    Value::Object(conditions)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn user_condition(who: &str) -> Value {
    if who.eq_ignore_ascii_case("me") {
        json!({ "isMe": { "eq": true } })
    } else if who.contains('@') {
        json!({ "email": { "eq": who } })
    } else {
        json!({ "name": { "eqIgnoreCase": who } })
    }
}

/// `ENG-123` → `("ENG", 123)`.
fn split_identifier(raw: &str) -> Option<(String, u64)> {
    let (key, number) = raw.rsplit_once('-')?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let number = number.parse::<u64>().ok()?;
    Some((key.to_ascii_uppercase(), number))
}
