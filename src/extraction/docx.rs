use super::ExtractionError;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use std::path::Path;

/// Extract paragraph text in document order, one line per paragraph.
pub(super) fn extract_docx(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let docx =
        docx_rs::read_docx(&bytes).map_err(|error| ExtractionError::Docx(error.to_string()))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();
    tracing::debug!(paragraphs = paragraphs.len(), "Loaded DOCX");

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        let ParagraphChild::Run(run) = child else {
            continue;
        };
        for run_child in &run.children {
            match run_child {
                RunChild::Text(node) => text.push_str(&node.text),
                RunChild::Tab(_) => text.push('\t'),
                RunChild::Break(_) => text.push('\n'),
                _ => {}
            }
        }
    }
    text
}
