//! storysync core library: story documents, domain types, configuration.
//!
//! - [`parser`]: document text → [`StoryDocument`]
//! - [`serializer`]: stories → document text
//! - [`writeback`]: set `linear_id` / `linear_url` in place, nothing else
//! - [`config`]: `~/.storysync/config.yaml`
//! - [`types`]: stories, import results, summaries

pub mod config;
pub mod error;
pub mod markdown;
pub mod parser;
pub mod serializer;
pub mod types;
pub mod writeback;

pub use config::Config;
pub use error::{ConfigError, DocumentError};
pub use parser::parse_document;
pub use serializer::serialize_document;
pub use types::{
    DocumentFailure, Frontmatter, ImportAction, ImportResult, ImportSummary, LinearLink, Story,
    StoryDocument,
};
pub use writeback::apply_writeback;
