//! Query helpers for exported runs.

use std::path::Path;

use lf_core::TankId;
use lf_project::ControllerProject;
use lf_results::{LoopSample, TelemetryHistory};

use crate::error::{AppError, AppResult};
use crate::metrics::{LoopMetrics, compute_loop_metrics};

/// Summary of a run's time range and per-loop performance.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    /// Indexed by tank.
    pub loops: [LoopMetrics; 2],
}

/// `(time, value)` series of one loop variable.
pub fn extract_loop_series(
    history: &TelemetryHistory,
    tank: TankId,
    field: impl Fn(&LoopSample) -> f64,
) -> Vec<(f64, f64)> {
    history
        .iter()
        .map(|r| (r.time_s, field(r.loop_sample(tank))))
        .collect()
}

/// Per-tank valve command ceilings a project's loops clamp to.
pub fn upper_limits(project: &ControllerProject) -> [f64; 2] {
    TankId::ALL.map(|tank| project.loop_for(tank).map_or(1.0, |l| l.out_max))
}

/// Summarize a run; saturation is measured against `upper_limits`, indexed
/// by tank.
pub fn get_run_summary(
    history: &TelemetryHistory,
    upper_limits: [f64; 2],
) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (history.records().first(), history.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };

    let metrics = |tank: TankId| {
        let measured = extract_loop_series(history, tank, |s| s.measurement);
        let setpoint = extract_loop_series(history, tank, |s| s.setpoint);
        let command = extract_loop_series(history, tank, |s| s.command);
        compute_loop_metrics(
            &measured,
            &setpoint,
            Some(&command),
            upper_limits[tank.index()],
        )
    };

    Ok(RunSummary {
        time_range: (first.time_s, last.time_s),
        record_count: history.len(),
        loops: [metrics(TankId::A)?, metrics(TankId::B)?],
    })
}

/// Reload an exported CSV and summarize it.
pub fn load_run_summary(csv_path: &Path, upper_limits: [f64; 2]) -> AppResult<RunSummary> {
    let history = lf_results::load_csv(csv_path)?;
    get_run_summary(&history, upper_limits)
}
