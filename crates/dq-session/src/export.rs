//! Saving CSV exports
//!
//! The session reproduces the current filter/search state as a one-shot
//! full-dataset export request; the resulting byte stream is handed to a
//! [`FileSaver`] collaborator. Where the file actually lands (disk, a save
//! dialog) is the shell's concern.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use dq_client::ApiError;

/// Errors surfaced to the user when an export fails.
///
/// Export is a deliberate user action, so unlike chart failures nothing is
/// swallowed; and no partial file is ever produced.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no dataset is open")]
    NoDataset,

    #[error("export request failed: {0}")]
    Request(#[from] ApiError),

    #[error("failed to save export: {0}")]
    Save(#[source] anyhow::Error),
}

/// Sink for a completed export.
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// Persist `contents` under `filename`. Called only with a complete
    /// byte stream.
    async fn save(&self, filename: &str, contents: Bytes) -> anyhow::Result<()>;
}

/// Saves exports into a directory on disk.
pub struct DiskSaver {
    dir: PathBuf,
}

impl DiskSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSaver for DiskSaver {
    async fn save(&self, filename: &str, contents: Bytes) -> anyhow::Result<()> {
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &contents).await?;
        Ok(())
    }
}
