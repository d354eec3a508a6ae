//! Core data types and error definitions for the embedding pipeline.

use crate::embedding::EmbeddingClientError;
use crate::extraction::{DocumentKind, ExtractionError};
use crate::processing::staging::StagingError;
use axum::http::StatusCode;
use thiserror::Error;

/// Errors produced while configuring the chunker.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A chunk must hold at least one word.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Terminal failures of one embedding request.
///
/// Every variant raised after staging is returned only once the staged upload has been removed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request carried no file part.
    #[error("No file provided")]
    MissingFile,
    /// Filename does not end in a supported extension.
    #[error("Unsupported file type")]
    UnsupportedType {
        /// Filename as supplied by the client.
        filename: String,
    },
    /// Upload could not be written to the staging area.
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] StagingError),
    /// Decoder could not read the document.
    #[error("Error extracting text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Document contained nothing but whitespace.
    #[error("No text extracted from file")]
    EmptyText,
    /// Embedding model failed on one of the chunks.
    #[error("Error generating embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
}

impl PipelineError {
    /// Whether the failure was caused by the request rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFile | Self::UnsupportedType { .. } | Self::EmptyText
        )
    }

    /// HTTP status reported for this failure: 400 for request faults, 500 otherwise.
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Errors raised while assembling an [`crate::processing::EmbeddingService`] at startup.
#[derive(Debug, Error)]
pub enum InitError {
    /// Staging directory could not be created.
    #[error(transparent)]
    Staging(#[from] StagingError),
    /// Chunk size configuration is invalid.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    /// Embedding client could not be constructed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
}

/// A file received with a request.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename supplied by the client; used for extension dispatch.
    pub filename: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Bundle a filename with its content.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of a successful request: one vector per chunk, in chunk order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutcome {
    /// Format the document was decoded as.
    pub document_kind: DocumentKind,
    /// Embedding vectors in chunk order.
    pub embeddings: Vec<Vec<f32>>,
}

impl EmbeddingOutcome {
    /// Number of chunks (and therefore vectors) produced.
    pub fn chunk_count(&self) -> usize {
        self.embeddings.len()
    }
}
