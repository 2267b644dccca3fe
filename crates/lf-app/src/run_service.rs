//! Run execution service.
//!
//! Builds the engine from a project and runs it against the simulated plant,
//! either paced by the wall clock or on virtual time as fast as the machine
//! allows.

use std::path::PathBuf;
use std::sync::Arc;

use lf_core::{Clock, ManualClock, StopSignal, SystemClock};
use lf_io::{CalibratedSensor, DacActuator};
use lf_project::ControllerProject;
use lf_results::{CsvExporter, compute_run_id};
use lf_sim::SharedPlant;
use tracing::info;

use crate::display::DisplaySink;
use crate::engine::{ControlLoopEngine, RunIdentity, RunReport};
use crate::error::{AppError, AppResult};
use crate::runtime_compile;

/// How loop time relates to wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// One period of loop time per period of wall time.
    #[default]
    RealTime,
    /// Virtual time; sleeps return immediately. Needs a duration limit.
    Accelerated,
}

/// Per-invocation overrides on top of the project file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub clock: ClockMode,
    pub max_run_duration_s: Option<f64>,
    pub export_dir: Option<PathBuf>,
}

/// Run the project's control loop until `stop` fires or a limit is reached.
///
/// Returns the report even when the run ended on a fault; inspect
/// [`RunReport::fault`].
pub fn execute_run(
    project: &ControllerProject,
    options: &RunOptions,
    stop: StopSignal,
    display: Option<Box<dyn DisplaySink>>,
) -> AppResult<RunReport> {
    let mut project = project.clone();
    if let Some(limit) = options.max_run_duration_s {
        project.run.max_run_duration_s = Some(limit);
    }
    if let Some(dir) = &options.export_dir {
        project.export.directory = dir.to_string_lossy().into_owned();
    }
    crate::project_service::validate_project(&project)?;

    if options.clock == ClockMode::Accelerated && project.run.max_run_duration_s.is_none() {
        return Err(AppError::InvalidInput(
            "accelerated runs need a maximum run duration".to_string(),
        ));
    }

    let clock: Arc<dyn Clock> = match options.clock {
        ClockMode::RealTime => Arc::new(SystemClock::new()),
        ClockMode::Accelerated => Arc::new(ManualClock::new()),
    };

    let calibration = runtime_compile::build_calibration(&project.calibration)?;
    let plant = runtime_compile::build_plant(&project.plant, calibration)?;
    let plant = SharedPlant::new(plant, Arc::clone(&clock));

    let sensor = CalibratedSensor::new(plant.sensor(), calibration, Arc::clone(&clock))?;
    let actuator = DacActuator::new(plant.dac());
    let exporter = CsvExporter::new(&project.export.directory, &project.export.file_prefix)
        .with_manifest(project.export.manifest);

    let mut identity = RunIdentity::new("", &project.name);
    identity.run_id = compute_run_id(&project, &identity.started_at.to_rfc3339());
    info!(
        run_id = %identity.run_id,
        project = %project.name,
        clock = ?options.clock,
        "starting run"
    );

    let mut engine = ControlLoopEngine::new(
        sensor,
        actuator,
        exporter,
        clock,
        runtime_compile::build_loops(&project)?,
        runtime_compile::engine_config(&project)?,
        stop,
    )
    .with_identity(identity);
    if let Some(display) = display {
        engine = engine.with_display(display);
    }

    Ok(engine.run())
}
