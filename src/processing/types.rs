//! Core data types and error definitions for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while slicing text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible chunk size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Batch-level failures surfaced by ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Caller supplied an unusable request or configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Every file in the batch extracted to empty text.
    #[error("No valid text to process")]
    EmptyCorpus,
    /// The combined-text artifact could not be written.
    #[error("Failed to persist combined text to {path}: {source}")]
    Persist {
        /// Artifact path we attempted to write.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<ChunkingError> for IngestError {
    fn from(error: ChunkingError) -> Self {
        Self::InvalidArgument(error.to_string())
    }
}

/// A file supplied with its raw bytes.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Original file name; its extension selects the extractor.
    pub file_name: String,
    /// Undecoded file contents.
    pub bytes: Vec<u8>,
}

impl RawFile {
    /// Pair a file name with its contents.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Wire form of an uploaded file: a name plus base64-encoded contents.
///
/// Both fields are optional so that a batch with a malformed entry can skip it instead of
/// rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadedFile {
    /// Original file name.
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    /// Base64-encoded file contents.
    #[serde(default)]
    pub data: Option<String>,
}

/// Summary of a completed ingestion batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    /// Number of entries received in the request, including skipped ones.
    pub files_received: usize,
    /// Files that contributed text to the combined artifact.
    pub files_loaded: usize,
    /// Files whose extractor failed.
    pub files_failed: usize,
    /// Entries skipped before extraction (missing fields or undecodable payload).
    pub files_skipped: usize,
    /// Number of chunks now held by the corpus.
    pub chunk_count: usize,
    /// Location of the persisted combined-text artifact.
    pub artifact_path: PathBuf,
    /// Hex SHA-256 of the combined text.
    pub content_hash: String,
}
