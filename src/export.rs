// Spreadsheet export for laboratory templates
//
// - aggregate_exporter: iLab upload template, three combined concentration bands
// - raw_exporter: Harmonised DAA template, all six thresholds uncombined
// - workbook: shared single-sheet xlsx writer

pub mod aggregate_exporter;
pub mod raw_exporter;
pub mod workbook;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Record;

pub use aggregate_exporter::export_aggregate;
pub use raw_exporter::export_raw;
pub use workbook::{ExportError, ExportedWorkbook, NumericFormatError};

/// Which spreadsheet template to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Aggregate,
    Detail,
}

impl Template {
    pub fn export(self, records: &[Record]) -> Result<ExportedWorkbook, ExportError> {
        match self {
            Template::Aggregate => export_aggregate(records),
            Template::Detail => export_raw(records),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Aggregate => f.write_str("aggregate"),
            Template::Detail => f.write_str("detail"),
        }
    }
}
