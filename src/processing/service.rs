//! Processing service coordinating extraction, chunking, the corpus, and inference.

use crate::{
    config::Config,
    corpus::{Corpus, CorpusStore},
    extraction::{ExtractedDocument, ExtractionOutcome, Extractor, FileKind},
    inference::{InferenceClient, get_inference_client},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        artifact::ArtifactStore,
        chunking::chunk_text,
        query::QueryService,
        types::{IngestError, IngestSummary, RawFile, UploadedFile},
    },
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Coordinates the ingestion pipeline and answers questions over the loaded corpus.
///
/// The service owns the extractor, the corpus slot, the artifact store, the inference client,
/// and the metrics registry so that the HTTP surface and the CLI share the same components.
/// Construct it once near process start and share it through an `Arc`.
pub struct ProcessingService {
    extractor: Extractor,
    corpus: CorpusStore,
    artifacts: ArtifactStore,
    chunk_size: usize,
    query: QueryService,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the processing pipeline used by external surfaces (HTTP).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Decode, extract, combine, persist, chunk, and load a batch of uploaded files.
    async fn ingest_uploads(&self, files: Vec<UploadedFile>) -> Result<IngestSummary, IngestError>;

    /// Answer a question over the loaded corpus; failures are rendered into the answer.
    async fn answer_query(&self, query: &str) -> String;

    /// Summarize the loaded corpus; failures are rendered into the summary.
    async fn summarize(&self) -> String;

    /// Copy of the currently loaded corpus.
    async fn corpus_snapshot(&self) -> Corpus;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Assemble a service from explicit components.
    pub fn new(
        extractor: Extractor,
        artifacts: ArtifactStore,
        chunk_size: usize,
        client: Option<Arc<dyn InferenceClient>>,
    ) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidArgument(
                "chunk size must be greater than zero".into(),
            ));
        }
        let corpus = CorpusStore::new();
        Ok(Self {
            extractor,
            query: QueryService::new(corpus.clone(), client),
            corpus,
            artifacts,
            chunk_size,
            metrics: Arc::new(IngestMetrics::new()),
        })
    }

    /// Build the service described by `config`, including its inference client.
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        tracing::info!(
            chunk_size = config.chunk_size,
            artifact = %config.combined_file_path().display(),
            ocr_enabled = config.ocr_enabled,
            filter = ?config.text_filter,
            "Initializing processing service"
        );
        let service = Self::new(
            Extractor::from_config(config),
            ArtifactStore::new(config.combined_file_path()),
            config.chunk_size,
            get_inference_client(config),
        )?;
        if !service.query.has_backend() {
            tracing::warn!("No inference backend; queries will report the LLM as unavailable");
        }
        Ok(service)
    }

    /// Chunks currently loaded, in order.
    pub async fn chunks(&self) -> Vec<String> {
        self.corpus.snapshot().await.chunks
    }

    /// Ingest wire-format uploads: skip incomplete entries, decode base64, then load.
    pub async fn ingest_uploads(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<IngestSummary, IngestError> {
        let files_received = files.len();
        let mut raw_files = Vec::with_capacity(files_received);
        for (index, file) in files.into_iter().enumerate() {
            let (Some(file_name), Some(data)) = (file.file_name, file.data) else {
                tracing::warn!(index, "Skipping upload without fileName or data");
                continue;
            };
            if file_name.is_empty() || data.is_empty() {
                tracing::warn!(
                    index,
                    file = %file_name,
                    "Skipping upload with empty fileName or data"
                );
                continue;
            }
            match decode_payload(&data) {
                Ok(bytes) => raw_files.push(RawFile::new(file_name, bytes)),
                Err(error) => {
                    tracing::warn!(
                        file = %file_name,
                        error = %error,
                        "Skipping upload with invalid base64 data"
                    );
                }
            }
        }
        let files_skipped = files_received - raw_files.len();
        self.ingest(raw_files, files_received, files_skipped).await
    }

    /// Ingest files whose bytes are already in memory.
    pub async fn ingest_raw(&self, files: Vec<RawFile>) -> Result<IngestSummary, IngestError> {
        let files_received = files.len();
        self.ingest(files, files_received, 0).await
    }

    async fn ingest(
        &self,
        files: Vec<RawFile>,
        files_received: usize,
        files_skipped: usize,
    ) -> Result<IngestSummary, IngestError> {
        tracing::info!(files = files_received, skipped = files_skipped, "Processing batch");

        let documents = self.extract_all(files).await;
        let files_failed = documents.iter().filter(|doc| doc.is_failed()).count();
        let files_loaded = documents
            .iter()
            .filter(|doc| !doc.text().trim().is_empty())
            .count();
        let combined = combine_documents(&documents);

        if combined.trim().is_empty() {
            self.metrics
                .record_rejected(files_received as u64, files_failed as u64);
            tracing::warn!(
                files = files_received,
                failed = files_failed,
                "Batch produced no usable text"
            );
            return Err(IngestError::EmptyCorpus);
        }

        let chunks = chunk_text(&combined, self.chunk_size)?;
        let chunk_count = chunks.len();
        let content_hash = compute_content_hash(&combined);

        let mut corpus = self.corpus.begin_load().await;
        let artifact_path = match self.artifacts.write(&combined).await {
            Ok(path) => path,
            Err(source) => {
                self.metrics
                    .record_rejected(files_received as u64, files_failed as u64);
                tracing::error!(
                    path = %self.artifacts.path().display(),
                    error = %source,
                    "Failed to persist combined text"
                );
                return Err(IngestError::Persist {
                    path: self.artifacts.path().to_path_buf(),
                    source,
                });
            }
        };
        *corpus = Corpus::loaded(chunks, content_hash.clone());
        drop(corpus);

        self.metrics.record_loaded(
            files_received as u64,
            files_failed as u64,
            chunk_count as u64,
        );
        tracing::info!(
            files = files_received,
            loaded = files_loaded,
            failed = files_failed,
            skipped = files_skipped,
            chunks = chunk_count,
            chunk_size = self.chunk_size,
            artifact = %artifact_path.display(),
            "Corpus loaded"
        );

        Ok(IngestSummary {
            files_received,
            files_loaded,
            files_failed,
            files_skipped,
            chunk_count,
            artifact_path,
            content_hash,
        })
    }

    async fn extract_all(&self, files: Vec<RawFile>) -> Vec<ExtractedDocument> {
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let extractor = self.extractor.clone();
            let file_name = file.file_name.clone();
            let document = match tokio::task::spawn_blocking(move || {
                extractor.extract_document(&file.file_name, &file.bytes)
            })
            .await
            {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!(file = %file_name, error = %error, "Extraction task failed");
                    ExtractedDocument {
                        kind: FileKind::from_file_name(&file_name),
                        file_name,
                        outcome: ExtractionOutcome::Failed(error.to_string()),
                    }
                }
            };
            tracing::debug!(
                file = %document.file_name,
                kind = ?document.kind,
                chars = document.text().chars().count(),
                failed = document.is_failed(),
                "File extracted"
            );
            documents.push(document);
        }
        documents
    }

    /// Answer `query` over the loaded corpus.
    pub async fn answer_query(&self, query: &str) -> String {
        self.query.answer_query(query).await
    }

    /// Summarize the loaded corpus.
    pub async fn summarize(&self) -> String {
        self.query.summarize().await
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn ingest_uploads(&self, files: Vec<UploadedFile>) -> Result<IngestSummary, IngestError> {
        ProcessingService::ingest_uploads(self, files).await
    }

    async fn answer_query(&self, query: &str) -> String {
        ProcessingService::answer_query(self, query).await
    }

    async fn summarize(&self) -> String {
        ProcessingService::summarize(self).await
    }

    async fn corpus_snapshot(&self) -> Corpus {
        self.corpus.snapshot().await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

/// Concatenate `"\n--- {file_name} ---\n{text}\n"` for every document with non-blank text,
/// preserving input order.
pub fn combine_documents(documents: &[ExtractedDocument]) -> String {
    let mut combined = String::new();
    for document in documents {
        let text = document.text();
        if text.trim().is_empty() {
            continue;
        }
        combined.push_str("\n--- ");
        combined.push_str(&document.file_name);
        combined.push_str(" ---\n");
        combined.push_str(text);
        combined.push('\n');
    }
    combined
}

/// Hex-encoded SHA-256 of the combined text.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn decode_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = data.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
    BASE64.decode(compact)
}
