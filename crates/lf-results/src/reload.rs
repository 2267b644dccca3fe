//! Reading exported runs back.

use crate::export::{CSV_COLUMNS, CsvRow};
use crate::history::TelemetryHistory;
use crate::types::{RunManifest, TelemetryRecord};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::Path;

/// Load a CSV written by [`CsvExporter`](crate::CsvExporter).
pub fn load_csv(path: &Path) -> ResultsResult<TelemetryHistory> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let header = reader.headers()?;
    if header.iter().ne(CSV_COLUMNS.iter().copied()) {
        return Err(ResultsError::InvalidHeader {
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut history = TelemetryHistory::new();
    for row in reader.deserialize::<CsvRow>() {
        history.append(TelemetryRecord::from(row?));
    }
    Ok(history)
}

pub fn load_manifest(path: &Path) -> ResultsResult<RunManifest> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
