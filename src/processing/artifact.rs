//! Durable copy of the most recent combined text.

use std::path::{Path, PathBuf};

/// Writes the combined-text artifact to a fixed path, overwriting the previous batch.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    /// Store artifacts at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `content`, creating the parent directory when missing.
    pub async fn write(&self, content: &str) -> std::io::Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!(
            path = %self.path.display(),
            bytes = content.len(),
            "Combined text persisted"
        );
        Ok(self.path.clone())
    }
}
