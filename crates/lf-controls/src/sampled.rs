//! Sampling period for a fixed-rate control loop.
//!
//! The loop runs one iteration per nominal period. After the work of an
//! iteration it sleeps for whatever is left of the period, measured from the
//! start of that iteration. Work that overruns the period is followed by no
//! sleep at all; the lateness is not carried into the next iteration.

use crate::error::{ControlError, ControlResult};
use std::time::Duration;

/// Sample configuration for a control loop.
///
/// The period is held both as seconds and as a non-zero [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    dt: f64,
    period: Duration,
}

impl SampleConfig {
    /// Create a sample configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `dt` is not finite and positive, or does not map
    /// onto a non-zero [`Duration`] (shorter than a nanosecond or too large).
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample period must be finite and positive",
            });
        }
        let period = Duration::try_from_secs_f64(dt).map_err(|_| ControlError::InvalidArg {
            what: "sample period is too large",
        })?;
        if period.is_zero() {
            return Err(ControlError::InvalidArg {
                what: "sample period is shorter than one nanosecond",
            });
        }
        Ok(Self { dt, period })
    }

    /// Create a sample configuration from a rate in Hz.
    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample frequency must be finite and positive",
            });
        }
        Self::new(1.0 / freq_hz)
    }

    /// Nominal sample period in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Sample frequency in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep owed after an iteration whose work took `work`.
    pub fn remaining(&self, work: Duration) -> Duration {
        self.period().saturating_sub(work)
    }

    /// Whether an iteration's work consumed the whole period.
    pub fn overran(&self, work: Duration) -> bool {
        work >= self.period()
    }
}
