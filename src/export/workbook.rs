use rust_xlsxwriter::{Format, FormatBorder, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Both templates are uploaded as a single sheet with this name
pub const SHEET_NAME: &str = "Sheet1";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: no records were extracted")]
    NothingToExport,

    #[error("Failed to write spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// A stored count that could not be read as a number. Only the affected cell
/// is lost; the rest of the row and the other rows are still written.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Cannot convert '{value}' to a number (record {record}, column '{column}')")]
pub struct NumericFormatError {
    /// Zero-based position of the record in the export
    pub record: usize,
    pub column: String,
    pub value: String,
}

/// Finished xlsx bytes plus the cells that had to be left as "N/A"
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub bytes: Vec<u8>,
    pub numeric_errors: Vec<NumericFormatError>,
}

/// A data cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Write a header row and data rows to a single-sheet workbook in memory
pub fn write_table(headers: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let sheet_row = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => worksheet.write_string(sheet_row, col as u16, text)?,
                Cell::Number(number) => worksheet.write_number(sheet_row, col as u16, *number)?,
            };
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Wrote {} rows x {} columns ({} bytes)",
        rows.len(),
        headers.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Parse a stored (period-normalized) count
pub fn parse_count(
    value: &str,
    record: usize,
    column: &str,
) -> Result<f64, NumericFormatError> {
    value.trim().parse::<f64>().map_err(|_| {
        let e = NumericFormatError {
            record,
            column: column.to_string(),
            value: value.to_string(),
        };
        warn!("{}", e);
        e
    })
}
