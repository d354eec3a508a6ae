//! Text extraction from uploaded documents.
//!
//! Dispatch is a case-sensitive suffix match on the uploaded filename: `.pdf` goes to the
//! PDF decoder and `.docx` to the word-processor decoder. Anything else never reaches a
//! decoder. A file whose name lies about its content fails inside the decoder and surfaces
//! as [`ExtractionError`].

mod docx;
mod pdf;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
pub(crate) use docx::fixtures::write_docx;
#[cfg(test)]
pub(crate) use pdf::fixtures::write_pdf;

/// Document formats the extractor understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word-processor document.
    Docx,
}

impl DocumentKind {
    /// Classify `filename` by suffix, returning `None` for unsupported names.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if filename.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Lowercase label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Decoder-level faults raised while pulling text out of a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Staged file could not be read.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// PDF structure could not be parsed.
    #[error("invalid PDF: {0}")]
    Pdf(String),
    /// DOCX archive or XML could not be parsed.
    #[error("invalid DOCX: {0}")]
    Docx(String),
    /// Blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Worker(String),
}

/// Extract the text of the document at `path` on the blocking thread pool.
pub async fn extract(path: PathBuf, kind: DocumentKind) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_blocking(&path, kind))
        .await
        .map_err(|error| ExtractionError::Worker(error.to_string()))?
}

/// Synchronous extraction entry point used by [`extract`].
pub fn extract_blocking(path: &Path, kind: DocumentKind) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::Pdf => pdf::extract_pdf(path),
        DocumentKind::Docx => docx::extract_docx(path),
    }
}
