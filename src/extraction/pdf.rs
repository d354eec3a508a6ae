use super::ExtractionError;
use lopdf::Document;
use std::path::Path;

/// Extract text page by page in document order, concatenated without separators.
///
/// A page whose text cannot be decoded contributes an empty string; only a document that
/// cannot be loaded at all is an error. The line break lopdf emits after each page's last text
/// block is dropped so that adjacent pages run together.
pub(super) fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    let document = Document::load(path).map_err(|error| ExtractionError::Pdf(error.to_string()))?;
    let pages = document.get_pages();
    tracing::debug!(pages = pages.len(), "Loaded PDF");

    let page_texts = pages.keys().map(|&number| {
        document
            .extract_text(&[number])
            .map_err(|error| {
                tracing::debug!(page = number, error = %error, "Page yielded no text");
            })
            .ok()
            .map(strip_block_terminator)
    });
    Ok(concat_pages(page_texts))
}

/// lopdf ends every `ET` block with a newline; only the trailing run belongs to the page boundary.
fn strip_block_terminator(mut text: String) -> String {
    let kept = text.trim_end_matches(['\n', '\r']).len();
    text.truncate(kept);
    text
}

fn concat_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages.into_iter().flatten().collect()
}
