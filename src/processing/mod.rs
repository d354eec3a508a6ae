//! Document embedding pipeline: staging, chunking, and embedding orchestration.

pub mod chunking;
mod service;
pub mod staging;
pub mod types;

pub use chunking::{DEFAULT_MAX_WORDS, WordChunker, WordChunks};
pub use service::{EmbeddingApi, EmbeddingService};
pub use staging::{StagedUpload, StagingArea, StagingError};
pub use types::{ChunkingError, EmbeddingOutcome, InitError, PipelineError, Upload};
