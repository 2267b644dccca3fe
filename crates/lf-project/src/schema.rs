//! Configuration schema.
//!
//! The file is read once at startup and never changes during a run.

use lf_core::TankId;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerProject {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub run: RunDef,
    pub loops: Vec<LoopDef>,
    #[serde(default)]
    pub calibration: CalibrationDef,
    #[serde(default)]
    pub export: ExportDef,
    #[serde(default)]
    pub display: DisplayDef,
    #[serde(default)]
    pub plant: PlantDef,
}

impl ControllerProject {
    pub fn loop_for(&self, tank: TankId) -> Option<&LoopDef> {
        self.loops.iter().find(|l| l.tank == tank)
    }

    /// The bench rig: both tanks held at 35 %, tank B driven by a slow
    /// sinusoidal disturbance from 200 s on.
    pub fn reference() -> Self {
        let gains = GainsDef {
            kp: 0.08,
            ki: 0.005,
            kd: 0.0005,
        };
        Self {
            version: LATEST_VERSION,
            name: "Two-tank level control".to_string(),
            run: RunDef::default(),
            loops: vec![
                LoopDef {
                    tank: TankId::A,
                    gains,
                    out_min: 0.0,
                    out_max: 1.0,
                    setpoint: SetpointDef {
                        base: 35.0,
                        transition: None,
                    },
                },
                LoopDef {
                    tank: TankId::B,
                    gains,
                    out_min: 0.0,
                    out_max: 1.0,
                    setpoint: SetpointDef {
                        base: 35.0,
                        transition: Some(TransitionDef {
                            activation_time_s: 200.0,
                            waveform: WaveformDef::Sinusoid {
                                amplitude: 5.0,
                                frequency_hz: 0.005,
                            },
                        }),
                    },
                },
            ],
            calibration: CalibrationDef::default(),
            export: ExportDef::default(),
            display: DisplayDef::default(),
            plant: PlantDef::default(),
        }
    }
}

/// Loop timing and shutdown behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunDef {
    /// Nominal loop period in seconds.
    pub period_s: f64,
    /// Valve opening commanded on shutdown (1.0 = fully open).
    pub fail_safe_position: f64,
    /// Stop on its own after this long. Runs until interrupted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_run_duration_s: Option<f64>,
}

impl Default for RunDef {
    fn default() -> Self {
        Self {
            period_s: 1.0,
            fail_safe_position: 1.0,
            max_run_duration_s: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GainsDef {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// One tank's level loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopDef {
    pub tank: TankId,
    pub gains: GainsDef,
    pub out_min: f64,
    pub out_max: f64,
    pub setpoint: SetpointDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetpointDef {
    /// Level in percent.
    pub base: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionDef {
    /// Seconds after loop start.
    pub activation_time_s: f64,
    pub waveform: WaveformDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WaveformDef {
    Step { value: f64 },
    Sinusoid { amplitude: f64, frequency_hz: f64 },
}

/// Two-point calibration of one analog input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChannelCalibrationDef {
    pub v_min: f64,
    pub v_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

/// Calibration of all four analog inputs, indexed by tank / valve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationDef {
    pub tank_levels: [ChannelCalibrationDef; 2],
    pub valve_feedback: [ChannelCalibrationDef; 2],
}

impl Default for CalibrationDef {
    fn default() -> Self {
        let level = ChannelCalibrationDef {
            v_min: 0.4020122684408,
            v_max: 1.992060792870876,
            decimals: Some(2),
        };
        let valve = ChannelCalibrationDef {
            v_min: 0.001,
            v_max: 2.96,
            decimals: Some(3),
        };
        Self {
            tank_levels: [level; 2],
            valve_feedback: [valve; 2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportDef {
    /// Directory the telemetry CSV is written to.
    pub directory: String,
    /// File name stem; the run's start time is appended.
    pub file_prefix: String,
    /// Also write a JSON manifest next to the CSV.
    pub manifest: bool,
}

impl Default for ExportDef {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            file_prefix: "simulation_data".to_string(),
            manifest: true,
        }
    }
}

/// Live console display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayDef {
    pub enabled: bool,
    /// Snapshots buffered for the display before new ones are dropped.
    pub buffer: usize,
}

impl Default for DisplayDef {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorDef {
    #[default]
    Rk4,
    ForwardEuler,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TankDef {
    /// %/s with the valve fully open and no outflow.
    pub inflow_gain: f64,
    /// %/s per sqrt(%).
    pub outflow_coefficient: f64,
    pub initial_level: f64,
}

/// Simulated plant used when no hardware is attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlantDef {
    pub tanks: [TankDef; 2],
    pub valve_tau_s: f64,
    pub valve_rate_limit: f64,
    pub integrator: IntegratorDef,
    pub substep_s: f64,
    pub noise_volts: f64,
    pub seed: u64,
}

impl Default for PlantDef {
    fn default() -> Self {
        let tank = TankDef {
            inflow_gain: 1.2,
            outflow_coefficient: 0.1,
            initial_level: 0.0,
        };
        Self {
            tanks: [tank; 2],
            valve_tau_s: 2.0,
            valve_rate_limit: 0.5,
            integrator: IntegratorDef::Rk4,
            substep_s: 0.1,
            noise_volts: 0.0,
            seed: 0,
        }
    }
}
