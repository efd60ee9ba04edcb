//! File access for the importer and exporter.
//!
//! Writes go through `<path>.storysync.tmp` and a rename, so a story
//! document is either the old text or the new text, never a partial one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{io_err, SyncError};

/// Text-file collaborator injected into the importer and exporter.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_text(&self, path: &Path) -> Result<String, SyncError>;

    async fn write_text(&self, path: &Path, text: &str) -> Result<(), SyncError>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

/// `<path>.storysync.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.storysync.tmp", path.display()))
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read_text(&self, path: &Path) -> Result<String, SyncError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_err(path, e))
    }

    async fn write_text(&self, path: &Path, text: &str) -> Result<(), SyncError> {
        write_atomic_with_tmp(path, text, &tmp_path(path)).await
    }
}

async fn write_atomic_with_tmp(path: &Path, text: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    tokio::fs::write(tmp, text)
        .await
        .map_err(|e| io_err(tmp, e))?;

    if let Err(e) = tokio::fs::rename(tmp, path).await {
        let _ = tokio::fs::remove_file(tmp).await;
        return Err(io_err(path, e));
    }
    debug!(path = %path.display(), "wrote document");
    Ok(())
}
