// HIAC report parsing
//
// A HIAC particle-counter PDF is turned into records in three steps:
// - text_extractor: PDF bytes -> one text blob (pages joined with newlines)
// - page_splitter: blob -> per-sample segments on blank lines
// - field_extractor: segment -> Record via a fixed table of field rules

pub mod field_extractor;
pub mod page_splitter;
pub mod text_extractor;

pub use field_extractor::{Field, FieldExtractor, FieldNotFound, PageExtraction};
pub use page_splitter::split_pages;
pub use text_extractor::{ExtractionError, PdfTextExtractor, TextExtractor};
