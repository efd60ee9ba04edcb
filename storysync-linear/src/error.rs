//! Error types for storysync-linear.

use thiserror::Error;

/// Failure talking to the Linear API, as reported by a [`crate::LinearClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a usable HTTP response (connect, TLS,
    /// timeout, non-2xx status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with GraphQL `errors`.
    #[error("API error: {0}")]
    Api(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The single remote failure kind seen past the gateway.
///
/// Transport failures, GraphQL errors, and `success: false` payloads all
/// collapse into this one variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Linear request failed: {0}")]
    Remote(String),
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        GatewayError::Remote(err.to_string())
    }
}

/// Errors from name → id resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A required name (team or project) matched nothing.
    #[error("{kind} '{name}' not found in Linear")]
    NotFound { kind: &'static str, name: String },

    /// The lookup call itself failed.
    #[error("could not look up {kind} '{name}': {source}")]
    Remote {
        kind: &'static str,
        name: String,
        #[source]
        source: GatewayError,
    },
}
