//! Result data types.

use lf_core::TankId;
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// One loop's variables for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopSample {
    /// Level setpoint (%).
    pub setpoint: f64,
    /// Measured level (%).
    pub measurement: f64,
    /// Valve command sent this iteration (fraction).
    pub command: f64,
    /// Valve position feedback from the same reading as `measurement`.
    pub feedback: f64,
}

/// Snapshot of every loop for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Seconds since loop start.
    pub time_s: f64,
    pub loops: [LoopSample; 2],
}

impl TelemetryRecord {
    pub fn loop_sample(&self, tank: TankId) -> &LoopSample {
        &self.loops[tank.index()]
    }
}

/// Metadata written next to an exported CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339 local time the loop started.
    pub started_at: String,
    /// RFC 3339 local time the export was written.
    pub exported_at: String,
    pub period_s: f64,
    pub record_count: usize,
    pub stop_reason: String,
    /// File name of the CSV, relative to the manifest.
    pub csv_file: String,
}

/// What the exporter needs to know about the run besides its history.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    pub run_id: RunId,
    pub project_name: String,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub period_s: f64,
    pub stop_reason: String,
}
