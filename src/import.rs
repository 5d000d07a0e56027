//! CSV Import
//!
//! Reads blood-sugar exports in the `timestamp,reading,notes` layout, one
//! reading per line. The header row is optional and notes may be omitted.
//!
//! ```text
//! timestamp,reading,notes
//! 2024-01-15T08:00:00,120,Before breakfast
//! 2024-01-15T12:00:00,145,After lunch
//! ```

use crate::storage::NewReading;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Most per-row errors kept in a result
const MAX_REPORTED_ERRORS: usize = 100;

/// One accepted row, in the shape the import endpoint takes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedReading {
    pub timestamp: String,
    pub reading: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ImportedReading {
    /// Validate into a storable reading
    pub fn to_new_reading(&self) -> Result<NewReading, crate::storage::StorageError> {
        NewReading::parse(self.reading, &self.timestamp, self.notes.clone())
    }
}

/// Result of a CSV import operation
#[derive(Debug, Default)]
pub struct CsvImportResult {
    pub readings: Vec<ImportedReading>,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

impl CsvImportResult {
    pub fn rows_processed(&self) -> usize {
        self.readings.len()
    }
}

/// Import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Blood-sugar CSV importer
#[derive(Debug, Default)]
pub struct ReadingsImporter;

impl ReadingsImporter {
    pub fn new() -> Self {
        Self
    }

    /// Import readings from a CSV file
    pub fn import(&self, path: &Path) -> Result<CsvImportResult, ImportError> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    /// Import from a CSV string
    pub fn import_str(&self, csv_data: &str) -> Result<CsvImportResult, ImportError> {
        self.import_reader(csv_data.as_bytes())
    }

    fn import_reader<R: std::io::Read>(&self, rdr: R) -> Result<CsvImportResult, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);

        let mut result = CsvImportResult::default();

        for (idx, record) in reader.records().enumerate() {
            let line = idx + 1;

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.fail(format!("Line {}: {}", line, e));
                    continue;
                }
            };

            if line == 1 && is_header(&record) {
                continue;
            }

            // blank lines come through as a single empty field
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            match parse_row(&record) {
                Ok(reading) => result.readings.push(reading),
                Err(e) => result.fail(format!("Line {}: {}", line, e)),
            }
        }

        if result.errors.len() > MAX_REPORTED_ERRORS {
            let total = result.errors.len();
            result.errors.truncate(MAX_REPORTED_ERRORS);
            result
                .errors
                .push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        tracing::debug!(
            accepted = result.readings.len(),
            failed = result.rows_failed,
            "Parsed blood-sugar CSV"
        );

        Ok(result)
    }
}

impl CsvImportResult {
    fn fail(&mut self, message: String) {
        self.rows_failed += 1;
        self.errors.push(message);
    }
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(0)
        .map(|f| f.trim().eq_ignore_ascii_case("timestamp"))
        .unwrap_or(false)
}

fn parse_row(record: &csv::StringRecord) -> Result<ImportedReading, String> {
    let timestamp = record
        .get(0)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("missing timestamp")?;

    let reading_str = record
        .get(1)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("missing reading")?;

    let reading: f64 = reading_str
        .parse()
        .map_err(|_| format!("invalid reading '{}'", reading_str))?;

    // unquoted commas inside notes split into extra fields; fields are
    // read untrimmed so the rejoined text keeps its spacing
    let notes = if record.len() > 2 {
        let joined = record.iter().skip(2).collect::<Vec<_>>().join(",");
        Some(joined.trim().to_string()).filter(|n| !n.is_empty())
    } else {
        None
    };

    let row = ImportedReading {
        timestamp: timestamp.to_string(),
        reading,
        notes,
    };

    row.to_new_reading().map_err(|e| e.to_string())?;
    Ok(row)
}
