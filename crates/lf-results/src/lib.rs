//! lf-results: telemetry history, CSV export and reload.

pub mod export;
pub mod hash;
pub mod history;
pub mod reload;
pub mod types;

pub use export::{CSV_COLUMNS, CsvExporter, ExportedRun, TelemetryExporter, write_csv};
pub use hash::compute_run_id;
pub use history::TelemetryHistory;
pub use reload::{load_csv, load_manifest};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected CSV header: {found}")]
    InvalidHeader { found: String },
}
