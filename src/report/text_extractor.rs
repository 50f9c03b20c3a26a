use std::panic;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to extract text from PDF: {0}")]
    PdfExtraction(String),

    #[error("PDF parser aborted on malformed document")]
    ParserPanic,

    #[error("No page of the document contains text")]
    NoText,
}

/// Turns a document into one text blob, pages in order, each followed by a newline
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// `pdf-extract` backed extractor for HIAC report PDFs
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        // pdf-extract panics on some broken inputs instead of returning an error
        let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| {
                warn!("pdf-extract panicked on a {} byte document", bytes.len());
                ExtractionError::ParserPanic
            })?
            .map_err(|e| ExtractionError::PdfExtraction(e.to_string()))?;

        debug!("Extracted {} pages from {} bytes", pages.len(), bytes.len());
        let text = join_pages(&pages)?;
        info!("Extracted {} characters of text", text.len());
        Ok(text)
    }
}

/// Concatenate page texts, each followed by `\n`. Fails when every page is blank.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> Result<String, ExtractionError> {
    if pages.iter().all(|page| page.as_ref().trim().is_empty()) {
        return Err(ExtractionError::NoText);
    }

    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
        text.push('\n');
    }
    Ok(text)
}
