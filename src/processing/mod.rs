//! Document processing pipeline: normalization, chunking, ingestion, and querying.

pub mod artifact;
pub mod chunking;
pub mod normalize;
pub mod query;
mod service;
pub mod types;

pub use artifact::ArtifactStore;
pub use query::{QueryError, QueryService};
pub use service::{ProcessingApi, ProcessingService, combine_documents, compute_content_hash};
pub use types::{ChunkingError, IngestError, IngestSummary, RawFile, UploadedFile};
