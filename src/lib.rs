#![deny(missing_docs)]

//! Core library for the document embedding server.

/// HTTP routing and upload handler.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// PDF and DOCX text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Request and chunk counters.
pub mod metrics;
/// Staging, chunking, and the embedding pipeline.
pub mod processing;
