use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    batches_loaded: AtomicU64,
    batches_rejected: AtomicU64,
    files_received: AtomicU64,
    files_failed: AtomicU64,
    last_chunk_count: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch that replaced the corpus.
    pub fn record_loaded(&self, files_received: u64, files_failed: u64, chunk_count: u64) {
        self.batches_loaded.fetch_add(1, Ordering::Relaxed);
        self.files_received
            .fetch_add(files_received, Ordering::Relaxed);
        self.files_failed.fetch_add(files_failed, Ordering::Relaxed);
        self.last_chunk_count.store(chunk_count, Ordering::Relaxed);
    }

    /// Record a batch that produced no usable text or could not be persisted.
    pub fn record_rejected(&self, files_received: u64, files_failed: u64) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
        self.files_received
            .fetch_add(files_received, Ordering::Relaxed);
        self.files_failed.fetch_add(files_failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_loaded: self.batches_loaded.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            files_received: self.files_received.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            last_chunk_count: self.last_chunk_count.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Batches that replaced the corpus since startup.
    pub batches_loaded: u64,
    /// Batches rejected for lack of usable text or a persist failure.
    pub batches_rejected: u64,
    /// Upload entries received across all batches.
    pub files_received: u64,
    /// Files whose extractor failed.
    pub files_failed: u64,
    /// Chunk count of the most recent successful load.
    pub last_chunk_count: u64,
}
