//! Name → identifier resolution with a per-run cache.
//!
//! One [`Resolver`] per import/export run. Inputs that already look like
//! Linear ids (hyphenated UUIDs) are returned untouched; everything else
//! is looked up once and memoized, including lookups that found nothing.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{LinearClient, UserQuery};
use crate::error::{ClientError, GatewayError, ResolveError};

/// True for a canonical 36-character hyphenated UUID.
pub fn is_identifier(input: &str) -> bool {
    input.len() == 36 && Uuid::try_parse(input).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Team(String),
    Project { team_id: String, name: String },
    Label(String),
    User(String),
    State { team_id: String, name: String },
}

/// Memoized lookups for one run. `None` records a lookup that matched nothing.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<CacheKey, Option<String>>,
}

impl ResolutionCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of best-effort label resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelResolution {
    /// Ids of the labels that resolved, in input order.
    pub ids: Vec<String>,
    /// Names that matched nothing or whose lookup failed.
    pub unresolved: Vec<String>,
}

pub struct Resolver<'c> {
    client: &'c dyn LinearClient,
    cache: ResolutionCache,
}

impl<'c> Resolver<'c> {
    pub fn new(client: &'c dyn LinearClient) -> Self {
        Self {
            client,
            cache: ResolutionCache::default(),
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Team id for a team name or key. No match is an error.
    pub async fn team(&mut self, name: &str) -> Result<String, ResolveError> {
        let name = name.trim();
        if is_identifier(name) {
            return Ok(name.to_string());
        }
        let client = self.client;
        let key = CacheKey::Team(name.to_string());
        self.cached("team", key, name, || async move {
            let nodes = client.teams(name).await?;
            Ok(nodes.into_iter().map(|n| n.id).collect())
        })
        .await?
        .ok_or_else(|| not_found("team", name))
    }

    /// Project id for a project name within `team_id`. No match is an error.
    pub async fn project(&mut self, team_id: &str, name: &str) -> Result<String, ResolveError> {
        let name = name.trim();
        if is_identifier(name) {
            return Ok(name.to_string());
        }
        let client = self.client;
        let key = CacheKey::Project {
            team_id: team_id.to_string(),
            name: name.to_string(),
        };
        self.cached("project", key, name, || async move {
            let nodes = client.projects(team_id, name).await?;
            Ok(nodes.into_iter().map(|n| n.id).collect())
        })
        .await?
        .ok_or_else(|| not_found("project", name))
    }

    /// Label ids for `names`, skipping any that do not resolve.
    ///
    /// Never fails: unknown names and failed lookups are logged and
    /// reported in [`LabelResolution::unresolved`].
    pub async fn labels(&mut self, names: &[String]) -> LabelResolution {
        let mut resolution = LabelResolution::default();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if is_identifier(name) {
                resolution.ids.push(name.to_string());
                continue;
            }
            let client = self.client;
            let key = CacheKey::Label(name.to_string());
            let found = self
                .cached("label", key, name, || async move {
                    let nodes = client.labels(name).await?;
                    Ok(nodes.into_iter().map(|n| n.id).collect())
                })
                .await;
            match found {
                Ok(Some(id)) => resolution.ids.push(id),
                Ok(None) => {
                    warn!(label = name, "label not found in Linear, skipping");
                    resolution.unresolved.push(name.to_string());
                }
                Err(err) => {
                    warn!(label = name, error = %err, "label lookup failed, skipping");
                    resolution.unresolved.push(name.to_string());
                }
            }
        }
        resolution
    }

    /// User id for an email, a display name, or `me`. No match is `None`.
    pub async fn assignee(&mut self, who: &str) -> Result<Option<String>, ResolveError> {
        let who = who.trim();
        if is_identifier(who) {
            return Ok(Some(who.to_string()));
        }
        let query = user_query(who);
        let client = self.client;
        let key = CacheKey::User(who.to_string());
        self.cached("assignee", key, who, || async move {
            let nodes = client.users(&query).await?;
            Ok(nodes.into_iter().map(|n| n.id).collect())
        })
        .await
    }

    /// Workflow state id for a case-insensitive state name within `team_id`.
    pub async fn workflow_state(
        &mut self,
        team_id: &str,
        name: &str,
    ) -> Result<Option<String>, ResolveError> {
        let name = name.trim();
        if is_identifier(name) {
            return Ok(Some(name.to_string()));
        }
        let client = self.client;
        let key = CacheKey::State {
            team_id: team_id.to_string(),
            name: name.to_lowercase(),
        };
        self.cached("workflow state", key, name, || async move {
            let nodes = client.workflow_states(team_id, name).await?;
            Ok(nodes.into_iter().map(|n| n.id).collect())
        })
        .await
    }

    /// Cache lookup, falling back to `fetch` on a miss. First candidate wins.
    async fn cached<F, Fut>(
        &mut self,
        kind: &'static str,
        key: CacheKey,
        name: &str,
        fetch: F,
    ) -> Result<Option<String>, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, ClientError>>,
    {
        if let Some(hit) = self.cache.entries.get(&key) {
            debug!(kind, name, "resolution cache hit");
            return Ok(hit.clone());
        }

        let candidates = fetch().await.map_err(|e| ResolveError::Remote {
            kind,
            name: name.to_string(),
            source: GatewayError::from(e),
        })?;
        if candidates.len() > 1 {
            debug!(
                kind,
                name,
                candidates = candidates.len(),
                "multiple matches, using the first"
            );
        }
        let id = candidates.into_iter().next();
        self.cache.entries.insert(key, id.clone());
        Ok(id)
    }
}

/// `me`, an email, or a display name.
pub(crate) fn user_query(who: &str) -> UserQuery {
    if who.eq_ignore_ascii_case("me") {
        UserQuery::Me
    } else if who.contains('@') {
        UserQuery::Email(who.to_string())
    } else {
        UserQuery::Name(who.to_string())
    }
}

fn not_found(kind: &'static str, name: &str) -> ResolveError {
    ResolveError::NotFound {
        kind,
        name: name.to_string(),
    }
}
