//! The single replaceable chunk slot queried by the language model.
//!
//! Ingestion takes the write guard for the whole persist-and-replace step, so concurrent
//! batches serialize and the on-disk artifact always matches the loaded chunks. Queries take
//! the read guard only long enough to copy what they need.

use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::{RwLock, RwLockWriteGuard};

/// Chunks currently available for querying, with provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    /// Ordered chunks; concatenated they form the combined text.
    pub chunks: Vec<String>,
    /// RFC 3339 timestamp of the load, `None` while the corpus is empty.
    pub loaded_at: Option<String>,
    /// Hex SHA-256 of the combined text the chunks were cut from.
    pub content_hash: Option<String>,
}

impl Corpus {
    /// Build a freshly loaded corpus stamped with the current time.
    pub fn loaded(chunks: Vec<String>, content_hash: String) -> Self {
        let loaded_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        Self {
            chunks,
            loaded_at,
            content_hash: Some(content_hash),
        }
    }

    /// Whether no text has been loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Join the chunks with newlines to form a prompt context.
    pub fn context(&self) -> String {
        self.chunks.join("\n")
    }
}

/// Shared, lock-guarded corpus handle. Cloning shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    inner: Arc<RwLock<Corpus>>,
}

impl CorpusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current corpus.
    pub async fn snapshot(&self) -> Corpus {
        self.inner.read().await.clone()
    }

    /// Prompt context built from the current chunks, or `None` when nothing is loaded.
    pub async fn context(&self) -> Option<String> {
        let corpus = self.inner.read().await;
        (!corpus.is_empty()).then(|| corpus.context())
    }

    /// Number of chunks currently loaded.
    pub async fn chunk_count(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    /// Take exclusive access for a load; assign through the guard to replace the corpus.
    pub async fn begin_load(&self) -> RwLockWriteGuard<'_, Corpus> {
        self.inner.write().await
    }
}
