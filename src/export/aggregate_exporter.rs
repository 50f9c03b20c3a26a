use tracing::{info, instrument};

use super::workbook::{parse_count, write_table, Cell, ExportError, ExportedWorkbook, NumericFormatError};
use crate::models::{ParticleSize, Record, NOT_AVAILABLE};

/// Unit literal of the iLab template (lowercase "ml")
pub const AGGREGATE_UNIT: &str = "Particles/ml";

/// iLab template header, verbatim (including the missing space in ">=25")
pub const AGGREGATE_HEADERS: [&str; 9] = [
    "Instrument Sample Id",
    "Sample Name",
    "Particle Concentration (>= 2 mcm)",
    "Particle Concentration (>= 2 mcm) UoM",
    "Particle Concentration (>= 10 mcm)",
    "Particle Concentration (>= 10 mcm) UoM",
    "Particle Concentration (>=25 mcm)",
    "Particle Concentration (>=25 mcm) UoM",
    "Comment",
];

/// Concentration bands: header of the value column and the thresholds summed into it
const BANDS: [(&str, &[ParticleSize]); 3] = [
    (
        AGGREGATE_HEADERS[2],
        &[ParticleSize::Two, ParticleSize::Five],
    ),
    (
        AGGREGATE_HEADERS[4],
        &[ParticleSize::Ten, ParticleSize::Fifteen],
    ),
    (AGGREGATE_HEADERS[6], &[ParticleSize::TwentyFive]),
];

/// Sum of the stored counts for `sizes`; a missing threshold counts as 0
pub fn band_concentration(
    record: &Record,
    sizes: &[ParticleSize],
    index: usize,
    column: &str,
) -> Result<f64, NumericFormatError> {
    sizes.iter().try_fold(0.0, |total, &size| match record.count(size) {
        Some(value) => Ok(total + parse_count(value, index, column)?),
        None => Ok(total),
    })
}

/// Build the iLab upload workbook: one row per record, in record order
#[instrument(skip(records), fields(records = records.len()))]
pub fn export_aggregate(records: &[Record]) -> Result<ExportedWorkbook, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut numeric_errors = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let mut row = vec![
            Cell::from(record.material.as_str()),
            Cell::from(record.charge.as_str()),
        ];

        for (column, sizes) in BANDS {
            let value = match band_concentration(record, sizes, index, column) {
                Ok(total) => Cell::Number(total),
                Err(e) => {
                    numeric_errors.push(e);
                    Cell::from(NOT_AVAILABLE)
                }
            };
            row.push(value);
            row.push(Cell::from(AGGREGATE_UNIT));
        }

        row.push(Cell::from(record.operator_name.as_str()));
        rows.push(row);
    }

    let headers: Vec<String> = AGGREGATE_HEADERS.iter().map(|h| h.to_string()).collect();
    let bytes = write_table(&headers, &rows)?;

    info!(
        "Aggregate workbook: {} rows, {} unreadable counts",
        rows.len(),
        numeric_errors.len()
    );
    Ok(ExportedWorkbook {
        bytes,
        numeric_errors,
    })
}
