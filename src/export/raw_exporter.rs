use tracing::{info, instrument};

use super::workbook::{parse_count, write_table, Cell, ExportError, ExportedWorkbook};
use crate::models::{ParticleSize, Record, NOT_AVAILABLE};

/// Unit literal of the Harmonised DAA template (capital "L", differs from iLab)
pub const RAW_UNIT: &str = "Particles/mL";

/// Harmonised DAA header: id, name, then a value/unit pair per threshold
pub fn raw_headers() -> Vec<String> {
    let mut headers = vec![
        "Instrument Sample Id".to_string(),
        "Sample Name".to_string(),
    ];
    for size in ParticleSize::ALL {
        headers.push(value_header(size));
        headers.push(format!("{} UoM", value_header(size)));
    }
    headers
}

fn value_header(size: ParticleSize) -> String {
    format!("Particle Concentration (>= {size} mcm)")
}

/// Build the Harmonised DAA workbook, every threshold written as-is (0 if absent)
#[instrument(skip(records), fields(records = records.len()))]
pub fn export_raw(records: &[Record]) -> Result<ExportedWorkbook, ExportError> {
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

        for size in ParticleSize::ALL {
            let value = match record.count(size) {
                None => Cell::Number(0.0),
                Some(raw) => match parse_count(raw, index, &value_header(size)) {
                    Ok(number) => Cell::Number(number),
                    Err(e) => {
                        numeric_errors.push(e);
                        Cell::from(NOT_AVAILABLE)
                    }
                },
            };
            row.push(value);
            row.push(Cell::from(RAW_UNIT));
        }

        rows.push(row);
    }

    let bytes = write_table(&raw_headers(), &rows)?;

    info!(
        "Detail workbook: {} rows, {} unreadable counts",
        rows.len(),
        numeric_errors.len()
    );
    Ok(ExportedWorkbook {
        bytes,
        numeric_errors,
    })
}
