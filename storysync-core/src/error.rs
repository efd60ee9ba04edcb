//! Error types for storysync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a story document.
///
/// Everything else that is malformed inside a document (bad numbers,
/// unparseable metadata, odd frontmatter) is normalised, not rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document has no `## ` heading, so it declares no story.
    #[error("no stories found in {document}: expected at least one '## <title>' heading")]
    NoStories { document: String },

    /// Two stories in one document share a title; write-back could not
    /// tell them apart.
    #[error("duplicate story title '{title}' in {document}")]
    DuplicateTitle { document: String, title: String },
}

/// All errors that can arise from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// Neither the config file nor `LINEAR_API_KEY` supplied a credential.
    #[error("no Linear API key configured; set LINEAR_API_KEY or run `storysync config set --api-key <KEY>`")]
    MissingApiKey,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
