use super::{EmbeddingClient, EmbeddingClientError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Embedding client for a local Ollama runtime (`POST /api/embeddings`).
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Build a client for the runtime at `base_url` using `model`.
    pub fn new(base_url: String, model: String) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder()
            .user_agent("docembed/embedding")
            .build()
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OllamaClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": text,
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(EmbeddingClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaEmbeddingResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        Ok(body.embedding)
    }
}
