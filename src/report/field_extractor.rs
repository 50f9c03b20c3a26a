use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::models::{AverageCounts, ParticleSize, Record, NOT_AVAILABLE};

/// Logical fields read from a report page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Material,
    OperatorName,
    SampleDateTime,
    SensorSerialNumber,
    Charge,
    /// The whole averages table (missing "Average" marker)
    AverageCounts,
    /// A single threshold row inside the averages table
    AverageCount(ParticleSize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Material => f.write_str("Material"),
            Field::OperatorName => f.write_str("Operator Name"),
            Field::SampleDateTime => f.write_str("Sample Date and Time"),
            Field::SensorSerialNumber => f.write_str("Sensor Serial Number"),
            Field::Charge => f.write_str("Charge"),
            Field::AverageCounts => f.write_str("Average Cumulative Counts"),
            Field::AverageCount(size) => write!(f, "Average Cumulative Count (>= {size} mcm)"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[error("Field not found: {field}")]
pub struct FieldNotFound {
    pub field: Field,
}

/// A label rule: the pattern's first capture group is the field value
struct FieldRule {
    field: Field,
    pattern: &'static str,
}

const TEXT_FIELD_RULES: [FieldRule; 5] = [
    // "Material: X" and "Material X" both occur
    FieldRule {
        field: Field::Material,
        pattern: r"\bMaterial\b\s*:?\s*(\S+)",
    },
    FieldRule {
        field: Field::OperatorName,
        pattern: r"Operator Name\s*:\s*([^\s,/]+)",
    },
    FieldRule {
        field: Field::SampleDateTime,
        pattern: r"Sample Date\s*:\s*(\S+)",
    },
    FieldRule {
        field: Field::SensorSerialNumber,
        pattern: r"(?:Sensor Serial Number|SensorSerialNumber)\s*:\s*(\S+)",
    },
    // Charge can wrap over several lines, it ends where the sensor label starts.
    // Whole word only, "Discharge" is not the label.
    FieldRule {
        field: Field::Charge,
        pattern: r"(?is)\bCharge\b\s*:?\s*(.*?)(?:Sensor\s*Serial\s*Number|SensorSerialNumber)",
    },
];

/// Start of the averages table
const AVERAGE_MARKER: &str = "Average";

/// Three numeric columns after the size token; only the last one is cumulative
const COUNT_ROW_COLUMNS: &str = r"\s+([\d,.]+)\s+([\d,.]+)\s+([\d,.]+)";

/// Result of running every rule over one page segment
#[derive(Debug, Clone, PartialEq)]
pub struct PageExtraction {
    pub record: Record,
    /// Rules that did not match, in rule order
    pub missing: Vec<FieldNotFound>,
}

/// Compiled rule table for HIAC report pages
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    text_rules: Vec<(Field, Regex)>,
    count_rules: Vec<(ParticleSize, Regex)>,
}

impl FieldExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let text_rules = TEXT_FIELD_RULES
            .iter()
            .map(|rule| Ok((rule.field, Regex::new(rule.pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let count_rules = ParticleSize::ALL
            .iter()
            .map(|&size| {
                let pattern = format!(r"\b{}{COUNT_ROW_COLUMNS}", size.row_pattern());
                Ok((size, Regex::new(&pattern)?))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            text_rules,
            count_rules,
        })
    }

    /// Run every rule over a page. Never fails: misses become "N/A" (or an
    /// absent threshold) and are listed in `missing`.
    pub fn extract(&self, page: &str) -> PageExtraction {
        let mut record = Record::default();
        let mut missing = Vec::new();

        for (field, regex) in &self.text_rules {
            match apply_rule(*field, regex, page) {
                Ok(value) => match field {
                    Field::Material => record.material = value,
                    Field::OperatorName => record.operator_name = value,
                    Field::SampleDateTime => record.sample_datetime = value,
                    Field::SensorSerialNumber => record.sensor_serial_number = value,
                    Field::Charge => record.charge = value,
                    Field::AverageCounts | Field::AverageCount(_) => {}
                },
                Err(e) => {
                    debug!("{}, using {}", e, NOT_AVAILABLE);
                    missing.push(e);
                }
            }
        }

        let (counts, missing_counts) = self.extract_counts(page);
        record.average_counts = counts;
        missing.extend(missing_counts);

        PageExtraction { record, missing }
    }

    /// Apply the rule for a single text field
    pub fn match_field(&self, field: Field, page: &str) -> Result<String, FieldNotFound> {
        let regex = self
            .text_rules
            .iter()
            .find(|(rule_field, _)| *rule_field == field)
            .map(|(_, regex)| regex)
            .ok_or(FieldNotFound { field })?;

        apply_rule(field, regex, page)
    }

    /// Read the cumulative average count for each threshold from the table
    /// that starts at the first "Average" in the page.
    pub fn extract_counts(&self, page: &str) -> (AverageCounts, Vec<FieldNotFound>) {
        let mut counts = AverageCounts::new();

        let Some(start) = page.find(AVERAGE_MARKER) else {
            debug!("No '{}' marker on page, averages table skipped", AVERAGE_MARKER);
            return (
                counts,
                vec![FieldNotFound {
                    field: Field::AverageCounts,
                }],
            );
        };
        let table = &page[start..];

        let mut missing = Vec::new();
        for (size, regex) in &self.count_rules {
            match regex.captures(table).and_then(|caps| caps.get(3)) {
                Some(cumulative) => {
                    counts.insert(*size, normalize_decimal(cumulative.as_str()));
                }
                None => {
                    let e = FieldNotFound {
                        field: Field::AverageCount(*size),
                    };
                    debug!("{}", e);
                    missing.push(e);
                }
            }
        }

        (counts, missing)
    }
}

fn apply_rule(field: Field, regex: &Regex, page: &str) -> Result<String, FieldNotFound> {
    let value = regex
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(FieldNotFound { field })?;

    Ok(match field {
        Field::Charge => value.trim().to_string(),
        _ => value.to_string(),
    })
}

/// Use `.` as the only fractional separator ("2,345" -> "2.345")
pub fn normalize_decimal(value: &str) -> String {
    value.replace(',', ".")
}
