use super::{EmbeddingClient, EmbeddingClientError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client for `base_url` authenticating with `api_key`.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
    ) -> Result<Self, EmbeddingClientError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim())).map_err(|_| {
            EmbeddingClientError::ProviderUnavailable("invalid OpenAI API key".to_string())
        })?;
        headers.insert(AUTHORIZATION, auth);
        let http = Client::builder()
            .user_agent("docembed/embedding")
            .default_headers(headers)
            .build()
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            model,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "OpenAI embeddings request failed ({status}): {body}"
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::InvalidResponse(format!(
                "failed to parse OpenAI embedding response: {error}"
            ))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| {
                EmbeddingClientError::InvalidResponse("response contained no embeddings".into())
            })
    }
}
