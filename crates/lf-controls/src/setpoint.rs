//! Time-scheduled setpoints.
//!
//! A [`SetpointProfile`] holds a base value and at most one timed
//! [`Transition`]. Before the activation time the profile returns the base
//! value; from the activation time on it follows the transition's waveform,
//! with its phase referenced to the activation time.
//!
//! Profiles are immutable and [`SetpointProfile::value`] is a pure function of
//! elapsed time.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Waveform followed after a transition activates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Waveform {
    /// Jump to a new constant value.
    Step { value: f64 },
    /// Oscillate around the base value: `base + amplitude * sin(omega * tau)`.
    Sinusoid {
        amplitude: f64,
        /// Angular frequency in rad/s.
        angular_frequency: f64,
    },
}

impl Waveform {
    /// Sinusoid specified by its ordinary frequency in Hz.
    pub fn sinusoid_hz(amplitude: f64, frequency_hz: f64) -> Self {
        Self::Sinusoid {
            amplitude,
            angular_frequency: TAU * frequency_hz,
        }
    }
}

/// Scheduled change of a setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Elapsed time (seconds since loop start) at which the waveform begins.
    pub activation_time: f64,
    pub waveform: Waveform,
}

/// Setpoint as a function of elapsed run time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointProfile {
    base: f64,
    transition: Option<Transition>,
}

impl SetpointProfile {
    /// Constant setpoint for the whole run.
    pub fn constant(base: f64) -> Self {
        Self {
            base,
            transition: None,
        }
    }

    /// Base value followed by `transition`.
    ///
    /// # Errors
    ///
    /// Rejects non-finite parameters and negative activation times.
    pub fn with_transition(base: f64, transition: Transition) -> ControlResult<Self> {
        if !base.is_finite() {
            return Err(ControlError::NonFinite {
                what: "setpoint base",
                value: base,
            });
        }
        if !transition.activation_time.is_finite() || transition.activation_time < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "activation time must be finite and non-negative",
            });
        }
        let finite = match transition.waveform {
            Waveform::Step { value } => value.is_finite(),
            Waveform::Sinusoid {
                amplitude,
                angular_frequency,
            } => amplitude.is_finite() && angular_frequency.is_finite(),
        };
        if !finite {
            return Err(ControlError::InvalidArg {
                what: "waveform parameters must be finite",
            });
        }
        Ok(Self {
            base,
            transition: Some(transition),
        })
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Setpoint at `elapsed_seconds` after loop start.
    pub fn value(&self, elapsed_seconds: f64) -> f64 {
        let Some(transition) = &self.transition else {
            return self.base;
        };
        if elapsed_seconds < transition.activation_time {
            return self.base;
        }
        let since = elapsed_seconds - transition.activation_time;
        match transition.waveform {
            Waveform::Step { value } => value,
            Waveform::Sinusoid {
                amplitude,
                angular_frequency,
            } => self.base + amplitude * (angular_frequency * since).sin(),
        }
    }
}
