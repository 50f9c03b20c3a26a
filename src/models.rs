use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Value written for any text field whose rule found nothing
pub const NOT_AVAILABLE: &str = "N/A";

/// Particle size thresholds (µm) reported in the HIAC averages table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParticleSize {
    OnePointFive,
    Two,
    Five,
    Ten,
    Fifteen,
    TwentyFive,
}

impl ParticleSize {
    /// All thresholds in ascending order, matching the averages table rows
    pub const ALL: [ParticleSize; 6] = [
        ParticleSize::OnePointFive,
        ParticleSize::Two,
        ParticleSize::Five,
        ParticleSize::Ten,
        ParticleSize::Fifteen,
        ParticleSize::TwentyFive,
    ];

    /// Threshold as written in template headers ("1.5", "2", ...)
    pub fn label(self) -> &'static str {
        match self {
            ParticleSize::OnePointFive => "1.5",
            ParticleSize::Two => "2",
            ParticleSize::Five => "5",
            ParticleSize::Ten => "10",
            ParticleSize::Fifteen => "15",
            ParticleSize::TwentyFive => "25",
        }
    }

    /// Regex fragment for the first token of this threshold's averages row.
    ///
    /// The instrument prints sizes with three decimals and either separator,
    /// so 1.5 µm shows up as `1,500` / `1.500` and 2 µm as `2,000` / `2.000`.
    pub fn row_pattern(self) -> &'static str {
        match self {
            ParticleSize::OnePointFive => r"1[,.]500",
            ParticleSize::Two => r"2[,.]000",
            ParticleSize::Five => r"5[,.]000",
            ParticleSize::Ten => r"10[,.]000",
            ParticleSize::Fifteen => r"15[,.]000",
            ParticleSize::TwentyFive => r"25[,.]000",
        }
    }
}

impl fmt::Display for ParticleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ParticleSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Cumulative average counts keyed by threshold. Sizes whose row was not
/// found are simply absent.
pub type AverageCounts = BTreeMap<ParticleSize, String>;

/// One sample (one report page) extracted from a HIAC PDF
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub material: String,
    pub operator_name: String,
    /// Raw text after "Sample Date:", the instrument's format is not stable
    pub sample_datetime: String,
    pub sensor_serial_number: String,
    /// Batch identifier, used as "Sample Name" in the templates
    pub charge: String,
    pub average_counts: AverageCounts,
}

impl Record {
    /// Stored count for a threshold, if the averages row was found
    pub fn count(&self, size: ParticleSize) -> Option<&str> {
        self.average_counts.get(&size).map(String::as_str)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            material: NOT_AVAILABLE.to_string(),
            operator_name: NOT_AVAILABLE.to_string(),
            sample_datetime: NOT_AVAILABLE.to_string(),
            sensor_serial_number: NOT_AVAILABLE.to_string(),
            charge: NOT_AVAILABLE.to_string(),
            average_counts: AverageCounts::new(),
        }
    }
}

/// An uploaded report: display name plus raw PDF bytes
#[derive(Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
