//! Embedding pipeline: staging, extraction, chunking, per-chunk embedding, and cleanup.

use crate::{
    config::Config,
    embedding::{EmbeddingClient, EmbeddingClientError, build_embedding_client},
    extraction::{self, DocumentKind},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::{WordChunker, has_words},
        staging::StagingArea,
        types::{EmbeddingOutcome, InitError, PipelineError, Upload},
    },
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Turns one uploaded document into one embedding vector per chunk.
///
/// The service holds the process-wide embedding client, the staging area, and the metrics
/// registry. Build it once at startup and share it through an `Arc`; nothing in it is mutated
/// per request except the atomic counters.
pub struct EmbeddingService {
    embedding_client: Arc<dyn EmbeddingClient>,
    staging: StagingArea,
    chunker: WordChunker,
    embedding_dimension: usize,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait EmbeddingApi: Send + Sync {
    /// Run the full pipeline for one request. `None` means the request carried no file.
    async fn embed_upload(&self, upload: Option<Upload>)
    -> Result<EmbeddingOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl EmbeddingService {
    /// Assemble a service from already-built parts.
    pub fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
        staging: StagingArea,
        chunker: WordChunker,
        embedding_dimension: usize,
    ) -> Self {
        Self {
            embedding_client,
            staging,
            chunker,
            embedding_dimension,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the embedding client, staging area, and chunker described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, InitError> {
        let embedding_client = build_embedding_client(config)?;
        let staging = StagingArea::new(&config.staging_dir)?;
        let chunker = WordChunker::new(config.chunk_max_words)?;
        tracing::info!(
            staging_dir = %staging.root().display(),
            chunk_max_words = chunker.max_words(),
            "Embedding service ready"
        );
        Ok(Self::new(
            embedding_client,
            staging,
            chunker,
            config.embedding_dimension,
        ))
    }

    /// Stage, extract, chunk, and embed one upload.
    ///
    /// Once the upload is staged, the staged copy is removed exactly once before this returns,
    /// whatever the outcome. A removal failure is logged and never replaces the pipeline result.
    /// If any chunk fails to embed, the vectors already produced are discarded.
    pub async fn embed_upload(
        &self,
        upload: Option<Upload>,
    ) -> Result<EmbeddingOutcome, PipelineError> {
        let result = self.run(upload).await;
        match &result {
            Ok(outcome) => {
                self.metrics.record_success(outcome.chunk_count() as u64);
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(error = %error, "Embedding request failed");
            }
        }
        result
    }

    async fn run(&self, upload: Option<Upload>) -> Result<EmbeddingOutcome, PipelineError> {
        let Upload { filename, bytes } = upload.ok_or(PipelineError::MissingFile)?;
        tracing::info!(filename = %filename, bytes = bytes.len(), "Processing upload");

        let mut staged = self.staging.persist(&filename, &bytes).await?;
        drop(bytes);

        let result = self.embed_staged(&filename, staged.path()).await;

        if let Err(error) = staged.remove().await {
            tracing::error!(
                path = %staged.path().display(),
                error = %error,
                "Failed to remove staged upload"
            );
        }
        result
    }

    async fn embed_staged(
        &self,
        filename: &str,
        path: &Path,
    ) -> Result<EmbeddingOutcome, PipelineError> {
        let document_kind =
            DocumentKind::from_filename(filename).ok_or_else(|| PipelineError::UnsupportedType {
                filename: filename.to_string(),
            })?;

        let text = extraction::extract(path.to_path_buf(), document_kind).await?;
        tracing::debug!(
            kind = document_kind.as_str(),
            chars = text.len(),
            "Extracted text"
        );
        if !has_words(&text) {
            return Err(PipelineError::EmptyText);
        }

        let mut embeddings = Vec::new();
        for (index, chunk) in self.chunker.chunks(&text).enumerate() {
            let vector = self.embedding_client.generate_embedding(&chunk).await?;
            if vector.len() != self.embedding_dimension {
                return Err(EmbeddingClientError::DimensionMismatch {
                    expected: self.embedding_dimension,
                    actual: vector.len(),
                }
                .into());
            }
            tracing::trace!(chunk = index + 1, "Embedded chunk");
            embeddings.push(vector);
        }

        tracing::info!(
            filename,
            kind = document_kind.as_str(),
            chunks = embeddings.len(),
            dimension = self.embedding_dimension,
            "Document embedded"
        );
        Ok(EmbeddingOutcome {
            document_kind,
            embeddings,
        })
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl EmbeddingApi for EmbeddingService {
    async fn embed_upload(
        &self,
        upload: Option<Upload>,
    ) -> Result<EmbeddingOutcome, PipelineError> {
        EmbeddingService::embed_upload(self, upload).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        EmbeddingService::metrics_snapshot(self)
    }
}
