//! HTTP surface for the embedding server.
//!
//! - `POST /get-embedding` – Multipart upload with a `file` part (`.pdf` or `.docx`). Returns
//!   `{ "embeddings": [[f32, ...], ...] }`, one vector per chunk in document order, or
//!   `{ "error": "..." }` with a 4xx/5xx status.
//! - `GET /metrics` – Document, chunk, and failure counters.
//! - `GET /commands` – Machine-readable endpoint catalog.
//! - `GET /health` – Liveness probe.

use crate::metrics::MetricsSnapshot;
use crate::processing::{EmbeddingApi, PipelineError, Upload};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Multipart part that carries the document.
pub const FILE_FIELD: &str = "file";

/// Build the HTTP router exposing the upload endpoint and diagnostics.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: EmbeddingApi + 'static,
{
    Router::new()
        .route("/get-embedding", post(get_embedding::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Success response for `POST /get-embedding`.
#[derive(Serialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embed an uploaded document.
async fn get_embedding<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EmbeddingResponse>, AppError>
where
    S: EmbeddingApi,
{
    let upload = match multipart {
        Ok(mut multipart) => read_upload(&mut multipart).await?,
        Err(rejection) => {
            tracing::debug!(rejection = %rejection, "Request is not multipart");
            None
        }
    };
    let outcome = service.embed_upload(upload).await?;
    Ok(Json(EmbeddingResponse {
        embeddings: outcome.embeddings,
    }))
}

/// Pull the first `file` part out of the form. A part without a filename counts as absent.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            return Ok(None);
        };
        let bytes = field.bytes().await?;
        return Ok(Some(Upload::new(filename, bytes.to_vec())));
    }
    Ok(None)
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: EmbeddingApi,
{
    Json(service.metrics_snapshot())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "get_embedding",
                method: "POST",
                path: "/get-embedding",
                description: "Upload a .pdf or .docx as multipart field `file`. Text is extracted, split into chunks of up to 512 words, and embedded. Response returns { \"embeddings\": [[number]] } in chunk order.",
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return document, chunk, and failure counters.",
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Liveness probe.",
            },
        ],
    })
}

enum AppError {
    Pipeline(PipelineError),
    Multipart(MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Pipeline(error) => (error.status_code(), error.to_string()),
            Self::Multipart(error) => (error.status(), error.body_text()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}
