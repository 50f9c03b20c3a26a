use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::export::{ExportError, ExportedWorkbook, NumericFormatError, Template};
use crate::models::{Record, SourceDocument};
use crate::report::{split_pages, Field, FieldExtractor, PdfTextExtractor, TextExtractor};

/// Error types for batch extraction/export
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Nothing to export: no records could be extracted from the uploaded documents")]
    NothingToExport,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Invalid field rule: {0}")]
    Rules(#[from] regex::Error),
}

/// Something the caller should see about a batch that did not stop it
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("Skipped '{document}': {reason}")]
    DocumentSkipped { document: String, reason: String },

    #[error("'{document}' page {page}: {field} not found, using N/A")]
    FieldNotFound {
        document: String,
        /// One-based page segment within the document
        page: usize,
        field: Field,
    },

    #[error("{template} template: {error}")]
    NumericFormat {
        template: Template,
        error: NumericFormatError,
    },
}

/// Records of a batch in intake order, plus everything that went wrong
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Workbooks produced for one batch
#[derive(Debug, Clone)]
pub struct BatchExport {
    pub records: Vec<Record>,
    pub workbooks: Vec<(Template, ExportedWorkbook)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchExport {
    pub fn workbook(&self, template: Template) -> Option<&ExportedWorkbook> {
        self.workbooks
            .iter()
            .find(|(t, _)| *t == template)
            .map(|(_, workbook)| workbook)
    }
}

/// Runs documents through text extraction, page splitting and field rules,
/// then hands the records to the template exporters.
#[derive(Clone)]
pub struct BatchService {
    text_extractor: Arc<dyn TextExtractor>,
    field_extractor: FieldExtractor,
}

impl BatchService {
    pub fn new(text_extractor: Arc<dyn TextExtractor>) -> Result<Self, BatchError> {
        Ok(Self {
            text_extractor,
            field_extractor: FieldExtractor::new()?,
        })
    }

    /// Service reading real PDFs with `pdf-extract`
    pub fn with_pdf_extractor() -> Result<Self, BatchError> {
        Self::new(Arc::new(PdfTextExtractor::new()))
    }

    /// Extract records from every document, in the given order.
    ///
    /// Documents are processed one after another. A document that yields no
    /// text is skipped with a diagnostic; the rest of the batch continues.
    pub fn extract_batch(&self, documents: &[SourceDocument]) -> BatchOutcome {
        self.extract_batch_with(documents, |_| {})
    }

    /// Same as [`extract_batch`](Self::extract_batch), calling `on_document`
    /// after each document is done (progress reporting)
    #[instrument(skip(self, documents, on_document), fields(documents = documents.len()))]
    pub fn extract_batch_with<F>(
        &self,
        documents: &[SourceDocument],
        mut on_document: F,
    ) -> BatchOutcome
    where
        F: FnMut(&SourceDocument),
    {
        let start_time = Instant::now();
        let mut outcome = BatchOutcome::default();

        for document in documents {
            debug!(
                "Extracting text from '{}' ({} bytes)",
                document.name,
                document.bytes.len()
            );

            match self.text_extractor.extract_text(&document.bytes) {
                Ok(text) => {
                    let (records, diagnostics) = self.records_from_text(&document.name, &text);
                    info!("Extracted {} records from '{}'", records.len(), document.name);
                    outcome.records.extend(records);
                    outcome.diagnostics.extend(diagnostics);
                }
                Err(e) => {
                    warn!("Skipping '{}': {}", document.name, e);
                    outcome.diagnostics.push(Diagnostic::DocumentSkipped {
                        document: document.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            on_document(document);
        }

        info!(
            "Batch extraction finished: {} records from {} documents in {:.2}s",
            outcome.records.len(),
            documents.len(),
            start_time.elapsed().as_secs_f64()
        );
        outcome
    }

    /// Split one document's text into pages and run the field rules on each
    pub fn records_from_text(&self, document: &str, text: &str) -> (Vec<Record>, Vec<Diagnostic>) {
        let pages = split_pages(text);
        debug!("'{}' split into {} page segments", document, pages.len());

        let mut records = Vec::with_capacity(pages.len());
        let mut diagnostics = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let extraction = self.field_extractor.extract(page);

            if !extraction.missing.is_empty() {
                warn!(
                    "'{}' page {}: {} fields not found",
                    document,
                    index + 1,
                    extraction.missing.len()
                );
            }
            diagnostics.extend(extraction.missing.iter().map(|missing| {
                Diagnostic::FieldNotFound {
                    document: document.to_string(),
                    page: index + 1,
                    field: missing.field,
                }
            }));

            records.push(extraction.record);
        }

        (records, diagnostics)
    }

    /// Extract the batch and build the requested templates.
    ///
    /// Fails only when the whole batch produced no record at all.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub fn export_batch(
        &self,
        documents: &[SourceDocument],
        templates: &[Template],
    ) -> Result<BatchExport, BatchError> {
        let outcome = self.extract_batch(documents);
        export_records(outcome, templates)
    }
}

/// Build the requested templates from already extracted records
pub fn export_records(
    outcome: BatchOutcome,
    templates: &[Template],
) -> Result<BatchExport, BatchError> {
    let BatchOutcome {
        records,
        mut diagnostics,
    } = outcome;

    if records.is_empty() {
        error!("No records extracted, nothing to export");
        return Err(BatchError::NothingToExport);
    }

    let mut workbooks = Vec::with_capacity(templates.len());
    for &template in templates {
        let workbook = template.export(&records)?;
        diagnostics.extend(
            workbook
                .numeric_errors
                .iter()
                .cloned()
                .map(|error| Diagnostic::NumericFormat { template, error }),
        );
        info!(
            "Built {} workbook ({} bytes) for {} records",
            template,
            workbook.bytes.len(),
            records.len()
        );
        workbooks.push((template, workbook));
    }

    Ok(BatchExport {
        records,
        workbooks,
        diagnostics,
    })
}
