//! Embedding client abstraction and provider adapters.
//!
//! The model is built once at startup by [`build_embedding_client`] and then shared read-only
//! by every request as an `Arc<dyn EmbeddingClient>`.

mod ollama;
mod openai;

use crate::config::{Config, EmbeddingProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unreachable or could not be constructed.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider was unable to produce an embedding for the supplied input.
    #[error("failed to generate embedding: {0}")]
    GenerationFailed(String),
    /// Provider response could not be decoded.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
    /// Returned vector length does not match the configured model dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the model.
        expected: usize,
        /// Dimension of the vector actually returned.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce one embedding vector for `text`.
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError>;
}

/// Deterministic embedding client built on signed feature hashing of whitespace-separated words.
///
/// Useful offline and in tests: identical input always yields the identical unit-length vector,
/// and chunks sharing vocabulary land close together.
pub struct LocalHashClient {
    dimension: usize,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(word: &str) -> u64 {
    word.bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

impl LocalHashClient {
    /// Construct a hashing client producing vectors of `dimension` floats.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingClientError> {
        if dimension == 0 {
            return Err(EmbeddingClientError::ProviderUnavailable(
                "local embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];
        for word in text.split_whitespace() {
            let hash = fnv1a(word);
            let bucket = (hash % self.dimension as u64) as usize;
            // Top bit of the hash selects the sign.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm = embedding.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|value| *value /= norm);
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingClient for LocalHashClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        Ok(self.encode(text))
    }
}

/// Build the embedding client selected by the configuration.
pub fn build_embedding_client(
    config: &Config,
) -> Result<Arc<dyn EmbeddingClient>, EmbeddingClientError> {
    tracing::info!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        dimension = config.embedding_dimension,
        "Initializing embedding client"
    );
    let client: Arc<dyn EmbeddingClient> = match config.embedding_provider {
        EmbeddingProvider::Local => Arc::new(LocalHashClient::new(config.embedding_dimension)?),
        EmbeddingProvider::Ollama => Arc::new(OllamaClient::new(
            config.ollama_url.clone(),
            config.embedding_model.clone(),
        )?),
        EmbeddingProvider::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                EmbeddingClientError::ProviderUnavailable("OPENAI_API_KEY is not set".to_string())
            })?;
            Arc::new(OpenAiClient::new(
                config.openai_base_url.clone(),
                api_key,
                config.embedding_model.clone(),
            )?)
        }
    };
    Ok(client)
}
