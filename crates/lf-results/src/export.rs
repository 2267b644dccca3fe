//! Telemetry export.
//!
//! One CSV per run, named after the time it was written, with a fixed header:
//! per tank the level setpoint and measurement, per valve the command and the
//! measured position. An optional JSON manifest sits next to it.

use crate::history::TelemetryHistory;
use crate::types::{LoopSample, RunInfo, RunManifest, TelemetryRecord};
use crate::{ResultsError, ResultsResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const CSV_COLUMNS: [&str; 9] = [
    "Time",
    "Tank 1 Setpoint",
    "Tank 1 Measurement",
    "Tank 2 Setpoint",
    "Tank 2 Measurement",
    "CV 1 Setpoint",
    "CV 1 Measurement",
    "CV 2 Setpoint",
    "CV 2 Measurement",
];

/// Flat CSV row; field order must match [`CSV_COLUMNS`].
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "Tank 1 Setpoint")]
    tank1_setpoint: f64,
    #[serde(rename = "Tank 1 Measurement")]
    tank1_measurement: f64,
    #[serde(rename = "Tank 2 Setpoint")]
    tank2_setpoint: f64,
    #[serde(rename = "Tank 2 Measurement")]
    tank2_measurement: f64,
    #[serde(rename = "CV 1 Setpoint")]
    cv1_setpoint: f64,
    #[serde(rename = "CV 1 Measurement")]
    cv1_measurement: f64,
    #[serde(rename = "CV 2 Setpoint")]
    cv2_setpoint: f64,
    #[serde(rename = "CV 2 Measurement")]
    cv2_measurement: f64,
}

impl From<&TelemetryRecord> for CsvRow {
    fn from(r: &TelemetryRecord) -> Self {
        let [a, b] = r.loops;
        Self {
            time: r.time_s,
            tank1_setpoint: a.setpoint,
            tank1_measurement: a.measurement,
            tank2_setpoint: b.setpoint,
            tank2_measurement: b.measurement,
            cv1_setpoint: a.command,
            cv1_measurement: a.feedback,
            cv2_setpoint: b.command,
            cv2_measurement: b.feedback,
        }
    }
}

impl From<CsvRow> for TelemetryRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            time_s: row.time,
            loops: [
                LoopSample {
                    setpoint: row.tank1_setpoint,
                    measurement: row.tank1_measurement,
                    command: row.cv1_setpoint,
                    feedback: row.cv1_measurement,
                },
                LoopSample {
                    setpoint: row.tank2_setpoint,
                    measurement: row.tank2_measurement,
                    command: row.cv2_setpoint,
                    feedback: row.cv2_measurement,
                },
            ],
        }
    }
}

/// Write `history` as CSV, header first, records in insertion order.
///
/// The header is written even when the history is empty.
pub fn write_csv<W: Write>(writer: W, history: &TelemetryHistory) -> ResultsResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(CSV_COLUMNS)?;
    for record in history {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedRun {
    pub csv_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub record_count: usize,
}

/// Persists a run's telemetry once the loop has stopped.
pub trait TelemetryExporter: Send {
    fn export(&mut self, history: &TelemetryHistory, run: &RunInfo) -> ResultsResult<ExportedRun>;
}

impl<E: TelemetryExporter + ?Sized> TelemetryExporter for Box<E> {
    fn export(&mut self, history: &TelemetryHistory, run: &RunInfo) -> ResultsResult<ExportedRun> {
        (**self).export(history, run)
    }
}

/// Exporter writing `<prefix>_YYYYMMDD_HHMMSS.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    directory: PathBuf,
    file_prefix: String,
    write_manifest: bool,
}

impl CsvExporter {
    pub fn new(directory: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: file_prefix.into(),
            write_manifest: true,
        }
    }

    pub fn with_manifest(mut self, write_manifest: bool) -> Self {
        self.write_manifest = write_manifest;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_stem(&self, at: DateTime<Local>) -> String {
        format!("{}_{}", self.file_prefix, at.format("%Y%m%d_%H%M%S"))
    }

    /// Create the CSV without clobbering an earlier export from the same
    /// second.
    fn create_unique(&self, stem: &str) -> ResultsResult<(PathBuf, File)> {
        let mut last_err = None;
        for attempt in 0..100u32 {
            let name = match attempt {
                0 => format!("{stem}.csv"),
                n => format!("{stem}_{n}.csv"),
            };
            let path = self.directory.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(ResultsError::Io(e)),
            }
        }
        Err(ResultsError::Io(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AlreadyExists, "no free export file name")
        })))
    }
}

impl CsvExporter {
    /// Export as if written at `exported_at`, which names the files.
    ///
    /// The manifest is best-effort: if it cannot be written the CSV still
    /// stands and `manifest_path` is `None`.
    pub fn export_at(
        &self,
        history: &TelemetryHistory,
        run: &RunInfo,
        exported_at: DateTime<Local>,
    ) -> ResultsResult<ExportedRun> {
        fs::create_dir_all(&self.directory)?;

        let (csv_path, file) = self.create_unique(&self.file_stem(exported_at))?;
        write_new_csv(&csv_path, io::BufWriter::new(file), history)?;

        let manifest_path = if self.write_manifest {
            match write_manifest(&csv_path, history, run, exported_at) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(
                        csv = %csv_path.display(),
                        error = %e,
                        "run manifest not written"
                    );
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            path = %csv_path.display(),
            records = history.len(),
            "telemetry exported"
        );

        Ok(ExportedRun {
            csv_path,
            manifest_path,
            record_count: history.len(),
        })
    }
}

impl TelemetryExporter for CsvExporter {
    fn export(&mut self, history: &TelemetryHistory, run: &RunInfo) -> ResultsResult<ExportedRun> {
        self.export_at(history, run, Local::now())
    }
}

/// Write a freshly created CSV, removing it again if the write fails so no
/// truncated export is left behind.
fn write_new_csv<W: Write>(path: &Path, writer: W, history: &TelemetryHistory) -> ResultsResult<()> {
    let result = write_csv(writer, history);
    if result.is_err()
        && let Err(e) = fs::remove_file(path)
    {
        tracing::warn!(path = %path.display(), error = %e, "partial export not removed");
    }
    result
}

fn write_manifest(
    csv_path: &Path,
    history: &TelemetryHistory,
    run: &RunInfo,
    exported_at: DateTime<Local>,
) -> ResultsResult<PathBuf> {
    let csv_file = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let manifest = RunManifest {
        run_id: run.run_id.clone(),
        project_name: run.project_name.clone(),
        started_at: run.started_at.to_rfc3339(),
        exported_at: exported_at.to_rfc3339(),
        period_s: run.period_s,
        record_count: history.len(),
        stop_reason: run.stop_reason.clone(),
        csv_file,
    };
    let path = csv_path.with_extension("manifest.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(path)
}
