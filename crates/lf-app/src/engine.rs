//! Fixed-period control loop engine.
//!
//! One iteration:
//! 1. elapsed time since start
//! 2. read every sensor channel
//! 3. evaluate each tank's setpoint schedule and install it in its PID
//! 4. compute each valve command from the tank level and the actual interval
//!    since the previous iteration (the nominal period on the first)
//! 5. write both commands
//! 6. append a telemetry record and publish it to the display
//! 7. sleep out the rest of the nominal period
//!
//! The engine is either `Running` or `Stopping`. It enters `Stopping` when the
//! stop signal fires (checked at the top of each iteration and during the
//! sleep), when the run-duration limit is reached, or on a fault. On entering
//! `Stopping` it writes the fail-safe valve position exactly once, exports the
//! history exactly once and returns a [`RunReport`].

use crate::display::DisplaySink;
use crate::error::EngineError;
use chrono::{DateTime, Local};
use lf_controls::{PidController, SampleConfig, SetpointProfile};
use lf_core::{Clock, StopSignal, TankId};
use lf_io::{ActuatorAdapter, AdapterError, SensorAdapter, ValveCommands};
use lf_results::{
    ExportedRun, LoopSample, ResultsError, RunInfo, TelemetryExporter, TelemetryHistory,
    TelemetryRecord,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Per-tank loop state: scheduler, PID and the last command sent.
#[derive(Debug, Clone)]
pub struct TankLoop {
    pub tank: TankId,
    pub pid: PidController,
    pub setpoint: SetpointProfile,
    last_command: Option<f64>,
}

impl TankLoop {
    pub fn new(tank: TankId, pid: PidController, setpoint: SetpointProfile) -> Self {
        Self {
            tank,
            pid,
            setpoint,
            last_command: None,
        }
    }

    pub fn last_command(&self) -> Option<f64> {
        self.last_command
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample: SampleConfig,
    /// Valve position written on shutdown.
    pub fail_safe_position: f64,
    pub max_run_duration: Option<Duration>,
}

impl EngineConfig {
    pub fn new(sample: SampleConfig) -> Self {
        Self {
            sample,
            fail_safe_position: 1.0,
            max_run_duration: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Stopping,
}

/// Why the engine left `Running`.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Operator,
    DurationLimit,
    Fault(EngineError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Operator => write!(f, "operator stop"),
            StopReason::DurationLimit => write!(f, "run duration limit reached"),
            StopReason::Fault(e) => write!(f, "fault: {e}"),
        }
    }
}

/// Iteration timing over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleStats {
    pub iterations: u64,
    /// Iterations whose work took the whole period or longer.
    pub overruns: u64,
    pub max_work: Duration,
    pub total_work: Duration,
}

impl CycleStats {
    fn record(&mut self, work: Duration, overran: bool) {
        self.iterations += 1;
        if overran {
            self.overruns += 1;
        }
        self.max_work = self.max_work.max(work);
        self.total_work += work;
    }

    pub fn mean_work(&self) -> Duration {
        match u32::try_from(self.iterations) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_work / n,
            Err(_) => Duration::from_secs_f64(
                self.total_work.as_secs_f64() / self.iterations as f64,
            ),
        }
    }
}

/// Identity of a run as it appears in the export manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct RunIdentity {
    pub run_id: String,
    pub project_name: String,
    pub started_at: DateTime<Local>,
}

impl RunIdentity {
    pub fn new(run_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            project_name: project_name.into(),
            started_at: Local::now(),
        }
    }
}

/// Outcome of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub stop_reason: StopReason,
    pub stats: CycleStats,
    /// Result of the single fail-safe valve command.
    pub fail_safe: Result<(), AdapterError>,
    /// Result of the single export.
    pub export: Result<ExportedRun, ResultsError>,
    pub history: TelemetryHistory,
}

impl RunReport {
    pub fn fault(&self) -> Option<&EngineError> {
        match &self.stop_reason {
            StopReason::Fault(e) => Some(e),
            _ => None,
        }
    }
}

pub struct ControlLoopEngine<S, A, E, C> {
    sensor: S,
    actuator: A,
    exporter: E,
    clock: C,
    stop: StopSignal,
    loops: [TankLoop; 2],
    config: EngineConfig,
    identity: RunIdentity,
    display: Option<Box<dyn DisplaySink>>,
    history: TelemetryHistory,
    state: EngineState,
    stats: CycleStats,
}

impl<S, A, E, C> ControlLoopEngine<S, A, E, C>
where
    S: SensorAdapter,
    A: ActuatorAdapter,
    E: TelemetryExporter,
    C: Clock,
{
    pub fn new(
        sensor: S,
        actuator: A,
        exporter: E,
        clock: C,
        loops: [TankLoop; 2],
        config: EngineConfig,
        stop: StopSignal,
    ) -> Self {
        Self {
            sensor,
            actuator,
            exporter,
            clock,
            stop,
            loops,
            config,
            identity: RunIdentity::new("", ""),
            display: None,
            history: TelemetryHistory::new(),
            state: EngineState::Running,
            stats: CycleStats::default(),
        }
    }

    pub fn with_display(mut self, display: Box<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run until stopped, then perform the exit actions.
    pub fn run(mut self) -> RunReport {
        info!(
            run_id = %self.identity.run_id,
            period_s = self.config.sample.dt(),
            "control loop started"
        );
        let reason = self.run_until_stopped();
        self.shutdown(reason)
    }

    fn run_until_stopped(&mut self) -> StopReason {
        let start = self.clock.now();
        let nominal_dt = self.config.sample.dt();
        let mut previous: Option<Duration> = None;

        loop {
            if self.stop.is_stopped() {
                return StopReason::Operator;
            }

            let iteration_start = self.clock.now();
            let elapsed = iteration_start.saturating_sub(start);
            if let Some(limit) = self.config.max_run_duration
                && elapsed >= limit
            {
                info!(elapsed_s = elapsed.as_secs_f64(), "run duration limit reached");
                return StopReason::DurationLimit;
            }

            let dt = match previous {
                Some(previous) => iteration_start.saturating_sub(previous).as_secs_f64(),
                None => nominal_dt,
            };
            previous = Some(iteration_start);

            if let Err(e) = self.iterate(elapsed.as_secs_f64(), dt) {
                error!(iteration = self.stats.iterations, error = %e, "control loop fault");
                return StopReason::Fault(e);
            }

            let work = self.clock.now().saturating_sub(iteration_start);
            let overran = self.config.sample.overran(work);
            self.stats.record(work, overran);
            if overran {
                warn!(
                    iteration = self.stats.iterations,
                    work_ms = work.as_secs_f64() * 1e3,
                    "iteration overran its period"
                );
            }

            if self.clock.sleep(self.config.sample.remaining(work), &self.stop) {
                return StopReason::Operator;
            }
        }
    }

    fn iterate(&mut self, elapsed_s: f64, dt: f64) -> Result<(), EngineError> {
        let reading = self.sensor.read()?;

        let mut commands = ValveCommands::uniform(0.0);
        let mut samples = [LoopSample::default(); 2];
        for lp in &mut self.loops {
            let setpoint = lp.setpoint.value(elapsed_s);
            lp.pid.set_setpoint(setpoint);

            let level = reading.level(lp.tank);
            let command = lp
                .pid
                .compute(level, dt)
                .map_err(|source| EngineError::Control {
                    tank: lp.tank,
                    source,
                })?;
            lp.last_command = Some(command);

            let valve = lp.tank.valve();
            commands.set(valve, command);
            samples[lp.tank.index()] = LoopSample {
                setpoint,
                measurement: level,
                command,
                feedback: reading.valve_feedback(valve),
            };
        }

        self.actuator.write_all(&commands)?;

        let record = TelemetryRecord {
            time_s: elapsed_s,
            loops: samples,
        };
        self.history.append(record);
        if let Some(display) = self.display.as_mut() {
            display.publish(&record);
        }

        debug!(
            iteration = self.stats.iterations,
            elapsed_s,
            dt,
            level_a = samples[0].measurement,
            level_b = samples[1].measurement,
            cmd_a = samples[0].command,
            cmd_b = samples[1].command,
            "iteration"
        );
        Ok(())
    }

    fn shutdown(mut self, reason: StopReason) -> RunReport {
        self.state = EngineState::Stopping;
        info!(reason = %reason, iterations = self.stats.iterations, "control loop stopped");

        let position = self.config.fail_safe_position;
        info!(position, "sending fail-safe command to valves");
        let fail_safe = self.actuator.write_all(&ValveCommands::uniform(position));
        if let Err(e) = &fail_safe {
            error!(error = %e, "fail-safe command failed");
        }

        let run = RunInfo {
            run_id: self.identity.run_id.clone(),
            project_name: self.identity.project_name.clone(),
            started_at: self.identity.started_at,
            period_s: self.config.sample.dt(),
            stop_reason: reason.to_string(),
        };
        let export = self.exporter.export(&self.history, &run);
        if let Err(e) = &export {
            error!(error = %e, records = self.history.len(), "telemetry export failed");
        }

        RunReport {
            stop_reason: reason,
            stats: self.stats,
            fail_safe,
            export,
            history: std::mem::take(&mut self.history),
        }
    }
}
