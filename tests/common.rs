#![allow(dead_code)]

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use hiac_extract::report::{ExtractionError, TextExtractor};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

/// A report page laid out the way the HIAC software prints it
pub fn report_page(material: &str, charge: &str, operator: &str) -> String {
    format!(
        "HIAC PODS+ Report\n\
         Material: {material}\n\
         Operator Name: {operator}, QC Lab\n\
         Sample Date: 2024-01-05 10:32:11\n\
         Charge: {charge}\n\
         Sensor Serial Number: SN42\n\
         Runs: 4 Discard: 1\n\
         Average\n\
         Size (um) Counts Diff Cum/mL\n\
         1,500 812 204 1234,5\n\
         2,000 608 391 1030,5\n\
         5,000 217 160 639,5\n\
         10,000 57 41 79,5\n\
         15,000 16 12 38,5\n\
         25,000 4 4 4,5\n"
    )
}

/// Treats document bytes as already extracted text, so pipeline tests do
/// not depend on PDF rendering details
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::PdfExtraction(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        Ok(text.to_string())
    }
}

/// Build a single-page PDF with one text line per entry (Courier, top-down)
pub fn build_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("Td", vec![50.into(), 780.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content stream"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to write PDF");
    bytes
}

/// Open exported xlsx bytes and return the single sheet
pub fn read_sheet(bytes: &[u8]) -> Range<Data> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes.to_vec())).expect("Failed to open workbook");
    assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
    workbook
        .worksheet_range("Sheet1")
        .expect("Failed to read Sheet1")
}

pub fn cell_text(range: &Range<Data>, row: usize, col: usize) -> String {
    match range.get((row, col)) {
        Some(Data::String(s)) => s.clone(),
        other => panic!("Expected text at ({row}, {col}), got {other:?}"),
    }
}

pub fn cell_number(range: &Range<Data>, row: usize, col: usize) -> f64 {
    match range.get((row, col)) {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        other => panic!("Expected number at ({row}, {col}), got {other:?}"),
    }
}

pub fn header_row(range: &Range<Data>) -> Vec<String> {
    (0..range.width()).map(|col| cell_text(range, 0, col)).collect()
}
