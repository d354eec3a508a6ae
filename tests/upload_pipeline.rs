use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use async_trait::async_trait;
use docembed::{
    api,
    embedding::{EmbeddingClient, EmbeddingClientError, LocalHashClient, OllamaClient},
    processing::{EmbeddingService, StagingArea, WordChunker},
};
use docx_rs::{Docx, Paragraph, Run};
use httpmock::{Method::POST, MockServer};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "upload-pipeline-boundary";
const DIMENSION: usize = 384;

struct TestApp {
    _dir: TempDir,
    staging_root: std::path::PathBuf,
    router: Router,
}

impl TestApp {
    fn new(client: Arc<dyn EmbeddingClient>, dimension: usize) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging_root = dir.path().join("temp");
        let service = EmbeddingService::new(
            client,
            StagingArea::new(&staging_root).expect("staging area"),
            WordChunker::default(),
            dimension,
        );
        Self {
            router: api::create_router(Arc::new(service), 10 * 1024 * 1024),
            staging_root,
            _dir: dir,
        }
    }

    fn local() -> Self {
        Self::new(Arc::new(LocalHashClient::new(DIMENSION).expect("local client")), DIMENSION)
    }

    async fn upload(&self, filename: &str, content: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/get-embedding")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn assert_staging_empty(&self) {
        let leftovers = std::fs::read_dir(&self.staging_root)
            .expect("staging root exists")
            .count();
        assert_eq!(leftovers, 0, "staged uploads must not outlive the request");
    }
}

fn docx_bytes(dir: &Path, paragraphs: &[&str]) -> Vec<u8> {
    let path = dir.join("fixture.docx");
    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });
    let file = std::fs::File::create(&path).expect("create docx");
    docx.build().pack(file).expect("pack docx");
    std::fs::read(&path).expect("read docx")
}

/// Build a PDF with one page per entry; empty entries become pages without text.
fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        if !text.is_empty() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations }.encode().expect("encode page");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize pdf");
    bytes
}

/// Embeds every chunk as a constant vector and keeps the chunk text it was given.
#[derive(Default)]
struct RecordingClient {
    chunks: Mutex<Vec<String>>,
}

impl RecordingClient {
    fn chunks(&self) -> Vec<String> {
        self.chunks.lock().expect("chunks lock").clone()
    }
}

#[async_trait]
impl EmbeddingClient for RecordingClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        self.chunks
            .lock()
            .expect("chunks lock")
            .push(text.to_string());
        Ok(vec![0.25; DIMENSION])
    }
}

fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("token{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn docx_upload_returns_one_vector_per_chunk() {
    let app = TestApp::local();
    let fixtures = tempfile::tempdir().expect("fixtures");
    let body = words(1500);
    let content = docx_bytes(fixtures.path(), &["Introduction", body.as_str()]);

    let (status, json) = app.upload("report.docx", &content).await;

    assert_eq!(status, StatusCode::OK);
    let embeddings = json["embeddings"].as_array().expect("embeddings array");
    // "Introduction" plus 1500 words is 1501 words: 512 + 512 + 477.
    assert_eq!(embeddings.len(), 3);
    for vector in embeddings {
        assert_eq!(vector.as_array().expect("vector").len(), DIMENSION);
    }
    app.assert_staging_empty();
}

#[tokio::test]
async fn multi_page_pdf_with_blank_page_embeds_concatenated_text() {
    let client = Arc::new(RecordingClient::default());
    let app = TestApp::new(client.clone(), DIMENSION);
    let content = pdf_bytes(&["Hello world", "", "Second page"]);

    let (status, json) = app.upload("notes.pdf", &content).await;

    assert_eq!(status, StatusCode::OK);
    let embeddings = json["embeddings"].as_array().expect("embeddings array");
    assert_eq!(embeddings.len(), 1);
    assert_eq!(embeddings[0].as_array().expect("vector").len(), DIMENSION);
    assert_eq!(client.chunks(), vec!["Hello worldSecond page".to_string()]);
    app.assert_staging_empty();
}

#[tokio::test]
async fn identical_uploads_produce_identical_vectors() {
    let app = TestApp::local();
    let fixtures = tempfile::tempdir().expect("fixtures");
    let content = docx_bytes(fixtures.path(), &["Same text every time."]);

    let (_, first) = app.upload("a.docx", &content).await;
    let (_, second) = app.upload("a.docx", &content).await;

    assert_eq!(first["embeddings"], second["embeddings"]);
    app.assert_staging_empty();
}

#[tokio::test]
async fn unsupported_extension_is_client_error() {
    let app = TestApp::local();
    let (status, json) = app.upload("report.txt", b"plain text report").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Unsupported file type" }));
    app.assert_staging_empty();
}

#[tokio::test]
async fn empty_docx_is_client_error() {
    let app = TestApp::local();
    let fixtures = tempfile::tempdir().expect("fixtures");
    let content = docx_bytes(fixtures.path(), &[]);

    let (status, json) = app.upload("empty.docx", &content).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No text extracted from file");
    app.assert_staging_empty();
}

#[tokio::test]
async fn corrupt_pdf_is_server_error() {
    let app = TestApp::local();
    let (status, json) = app.upload("broken.pdf", b"%PDF-1.7 truncated").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().expect("error message");
    assert!(message.starts_with("Error extracting text:"), "{message}");
    app.assert_staging_empty();
}

#[tokio::test]
async fn provider_failure_is_server_error_without_partial_vectors() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(503).body("model loading");
        })
        .await;
    let client = OllamaClient::new(server.base_url(), "all-minilm".into()).expect("client");
    let app = TestApp::new(Arc::new(client), DIMENSION);
    let fixtures = tempfile::tempdir().expect("fixtures");
    let body = words(1200);
    let content = docx_bytes(fixtures.path(), &[body.as_str()]);

    let (status, json) = app.upload("long.docx", &content).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json.get("embeddings").is_none());
    assert!(
        json["error"]
            .as_str()
            .expect("error message")
            .starts_with("Error generating embeddings:")
    );
    // The first chunk fails, so the remaining chunks are never sent.
    mock.assert_hits_async(1).await;
    app.assert_staging_empty();
}

#[tokio::test]
async fn ollama_vectors_flow_through_in_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(200)
                .json_body(json!({ "embedding": [0.5, 0.5, 0.5, 0.5] }));
        })
        .await;
    let client = OllamaClient::new(server.base_url(), "all-minilm".into()).expect("client");
    let app = TestApp::new(Arc::new(client), 4);
    let fixtures = tempfile::tempdir().expect("fixtures");
    let body = words(600);
    let content = docx_bytes(fixtures.path(), &[body.as_str()]);

    let (status, json) = app.upload("two-chunks.docx", &content).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["embeddings"],
        json!([[0.5, 0.5, 0.5, 0.5], [0.5, 0.5, 0.5, 0.5]])
    );
    mock.assert_hits_async(2).await;
    app.assert_staging_empty();
}
