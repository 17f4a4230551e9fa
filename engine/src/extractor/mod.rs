//! Document text extraction
//!
//! Pulls the plain text of a single page out of a PDF reference document.
//! The document is loaded per call and dropped before returning, on success
//! and on every error path; nothing is cached between calls.
//!
//! Extraction is CPU and disk bound. Async callers run it through
//! `tokio::task::spawn_blocking`.

use lopdf::Document;
use sdk::errors::QuizError;
use std::path::Path;

/// Default number of characters kept from a page
pub const DEFAULT_CHAR_LIMIT: usize = 1000;

/// Extract the text of `page_number` (1-based) from the PDF at `path`.
///
/// The text is cut to its first `char_limit` characters and then trimmed.
///
/// # Errors
///
/// Returns `QuizError::Extraction` if the document cannot be opened or
/// parsed, the page does not exist, or text extraction fails.
pub fn extract(path: &Path, page_number: u32, char_limit: usize) -> Result<String, QuizError> {
    let doc = load(path)?;

    if !doc.get_pages().contains_key(&page_number) {
        return Err(QuizError::Extraction(format!(
            "{}: page {} out of range (document has {} pages)",
            path.display(),
            page_number,
            doc.get_pages().len()
        )));
    }

    let text = doc.extract_text(&[page_number]).map_err(|e| {
        QuizError::Extraction(format!(
            "{}: failed to extract page {}: {}",
            path.display(),
            page_number,
            e
        ))
    })?;

    let text = truncate_chars(&text, char_limit).trim().to_string();

    tracing::debug!(
        path = %path.display(),
        page = page_number,
        chars = text.chars().count(),
        "Extracted page text"
    );

    Ok(text)
}

/// Number of pages in the PDF at `path`.
pub fn page_count(path: &Path) -> Result<usize, QuizError> {
    Ok(load(path)?.get_pages().len())
}

fn load(path: &Path) -> Result<Document, QuizError> {
    Document::load(path)
        .map_err(|e| QuizError::Extraction(format!("{}: failed to open: {}", path.display(), e)))
}

/// First `limit` characters of `text` (not bytes).
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
