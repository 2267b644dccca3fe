#![allow(dead_code)]

use lf_app::{EngineConfig, TankLoop};
use lf_controls::{OutputLimits, PidController, PidGains, SampleConfig, SetpointProfile};
use lf_core::{ChannelId, Clock, ManualClock, StopSignal, TankId, ValveId};
use lf_io::{ActuatorAdapter, AdapterError, AdapterResult, ProcessReading, SensorAdapter, ValveCommands};
use lf_results::{ExportedRun, ResultsError, ResultsResult, RunInfo, TelemetryExporter, TelemetryHistory};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything the engine did to the outside world, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Read,
    Write(ValveId, f64),
    WriteAll(ValveCommands),
    Export(TelemetryHistory),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct ScriptedSensor {
    pub log: EventLog,
    pub clock: Arc<ManualClock>,
    pub levels: [f64; 2],
    /// Virtual time each read takes.
    pub work: Duration,
    /// Fail on this (1-based) read.
    pub fail_on: Option<usize>,
    /// Trigger the stop signal during this (1-based) read.
    pub stop_on: Option<(usize, StopSignal)>,
    reads: usize,
}

impl ScriptedSensor {
    pub fn new(log: EventLog, clock: Arc<ManualClock>, levels: [f64; 2]) -> Self {
        Self {
            log,
            clock,
            levels,
            work: Duration::ZERO,
            fail_on: None,
            stop_on: None,
            reads: 0,
        }
    }
}

impl SensorAdapter for ScriptedSensor {
    fn read(&mut self) -> AdapterResult<ProcessReading> {
        self.reads += 1;
        self.log.lock().push(Event::Read);
        if self.fail_on == Some(self.reads) {
            return Err(AdapterError::Read {
                channel: ChannelId::TankLevel(TankId::A),
                message: "ADC not responding".to_string(),
            });
        }
        let captured_at = self.clock.now();
        self.clock.advance(self.work);
        if let Some((n, stop)) = &self.stop_on
            && *n == self.reads
        {
            stop.trigger();
        }
        Ok(ProcessReading::from_parts(captured_at, self.levels, [0.5, 0.5]))
    }
}

pub struct RecordingActuator {
    pub log: EventLog,
    /// Fail on this (1-based) write_all call.
    pub fail_on: Option<usize>,
    calls: usize,
}

impl RecordingActuator {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_on: None,
            calls: 0,
        }
    }
}

impl ActuatorAdapter for RecordingActuator {
    fn write(&mut self, valve: ValveId, position: f64) -> AdapterResult<()> {
        self.log.lock().push(Event::Write(valve, position));
        Ok(())
    }

    fn write_all(&mut self, commands: &ValveCommands) -> AdapterResult<()> {
        self.calls += 1;
        self.log.lock().push(Event::WriteAll(*commands));
        if self.fail_on == Some(self.calls) {
            return Err(AdapterError::Write {
                valve: ValveId::B,
                message: "DAC nack".to_string(),
            });
        }
        Ok(())
    }
}

pub struct RecordingExporter {
    pub log: EventLog,
    pub fail: bool,
    pub runs: Arc<Mutex<Vec<RunInfo>>>,
}

impl RecordingExporter {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail: false,
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TelemetryExporter for RecordingExporter {
    fn export(&mut self, history: &TelemetryHistory, run: &RunInfo) -> ResultsResult<ExportedRun> {
        self.log.lock().push(Event::Export(history.clone()));
        self.runs.lock().push(run.clone());
        if self.fail {
            return Err(ResultsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        Ok(ExportedRun {
            csv_path: PathBuf::from("memory.csv"),
            manifest_path: None,
            record_count: history.len(),
        })
    }
}

pub fn tank_loops(setpoint: f64) -> [TankLoop; 2] {
    TankId::ALL.map(|tank| {
        TankLoop::new(
            tank,
            PidController::new(
                PidGains::new(0.08, 0.005, 0.0005).unwrap(),
                OutputLimits::unit(),
                setpoint,
            ),
            SetpointProfile::constant(setpoint),
        )
    })
}

pub fn one_second_config() -> EngineConfig {
    EngineConfig::new(SampleConfig::new(1.0).unwrap())
}

pub fn writes(log: &EventLog) -> Vec<ValveCommands> {
    log.lock()
        .iter()
        .filter_map(|e| match e {
            Event::WriteAll(c) => Some(*c),
            _ => None,
        })
        .collect()
}

pub fn exports(log: &EventLog) -> Vec<TelemetryHistory> {
    log.lock()
        .iter()
        .filter_map(|e| match e {
            Event::Export(h) => Some(h.clone()),
            _ => None,
        })
        .collect()
}
