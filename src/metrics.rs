use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing embedding requests.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_embedded: AtomicU64,
    chunks_embedded: AtomicU64,
    requests_failed: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that was embedded successfully and how many chunks it produced.
    pub fn record_success(&self, chunk_count: u64) {
        self.documents_embedded.fetch_add(1, Ordering::Relaxed);
        self.chunks_embedded
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a request that ended in an error response.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_embedded: self.documents_embedded.load(Ordering::Relaxed),
            chunks_embedded: self.chunks_embedded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents embedded since startup.
    pub documents_embedded: u64,
    /// Total chunks embedded across all successful documents.
    pub chunks_embedded: u64,
    /// Requests that ended in an error response.
    pub requests_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = PipelineMetrics::new();
        metrics.record_success(2);
        metrics.record_success(3);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_embedded, 2);
        assert_eq!(snapshot.chunks_embedded, 5);
        assert_eq!(snapshot.requests_failed, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
