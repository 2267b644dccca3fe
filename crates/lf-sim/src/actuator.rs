//! Valve actuator with first-order dynamics and rate limiting.

use crate::error::{SimError, SimResult};

/// First-order actuator with rate limiting.
///
/// Dynamics: dpos/dt = (cmd - pos) / tau, clamped to [-rate_limit, rate_limit].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirstOrderActuator {
    /// Time constant (seconds)
    pub tau: f64,
    /// Rate limit (1/second)
    pub rate_limit: f64,
}

impl FirstOrderActuator {
    pub fn new(tau: f64, rate_limit: f64) -> SimResult<Self> {
        if !(tau > 0.0) || !tau.is_finite() {
            return Err(SimError::InvalidArg {
                what: "tau must be positive",
            });
        }
        if !(rate_limit > 0.0) {
            return Err(SimError::InvalidArg {
                what: "rate_limit must be positive",
            });
        }
        Ok(Self { tau, rate_limit })
    }

    /// Position derivative for the current position and command.
    pub fn dpdt(&self, position: f64, command: f64) -> f64 {
        let raw = (command.clamp(0.0, 1.0) - position) / self.tau;
        raw.clamp(-self.rate_limit, self.rate_limit)
    }
}
