//! Error types for storysync-sync.

use std::path::PathBuf;

use thiserror::Error;

use storysync_core::DocumentError;
use storysync_linear::{GatewayError, ResolveError};

/// Everything that can stop one story, one document, or an export.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Remote(#[from] GatewayError),

    /// A story field the remote service would reject.
    #[error("{0}")]
    Validation(String),

    /// No team on the story, no `--team`, and no `default_team`.
    #[error("no team for story '{title}': set `team` in the document, pass --team, or configure default_team")]
    MissingTeam { title: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
