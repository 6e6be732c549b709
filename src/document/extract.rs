//! Text extraction port.
//!
//! PDF files go through `pdf-extract`; anything else is read as UTF-8 text.
//! Pages are split on form feeds, which is how `pdf-extract` separates them.

use crate::error::ExtractError;
use std::path::Path;

/// Extracts the text pages of one source file.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

/// Default extractor keyed on file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn unreadable(path: &Path, reason: impl ToString) -> ExtractError {
    ExtractError::UnreadableDocument {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

pub(crate) fn split_pages(text: &str) -> Vec<String> {
    text.split('\u{c}').map(|page| page.to_string()).collect()
}

impl TextExtractor for FileTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        let text = if is_pdf {
            let bytes = std::fs::read(path).map_err(|e| unreadable(path, e))?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| unreadable(path, e))?
        } else {
            std::fs::read_to_string(path).map_err(|e| unreadable(path, e))?
        };

        let pages = split_pages(&text);
        tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted text");
        Ok(pages)
    }
}
