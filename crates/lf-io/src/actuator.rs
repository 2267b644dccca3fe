//! Actuator side of the rig.

use crate::error::{AdapterError, AdapterResult};
use lf_core::ValveId;
use serde::{Deserialize, Serialize};

/// Native full-scale code of the 16-bit valve DAC.
pub const DAC_FULL_SCALE: u16 = u16::MAX;

/// One command per valve, normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValveCommands {
    positions: [f64; 2],
}

impl ValveCommands {
    pub fn new(a: f64, b: f64) -> Self {
        Self { positions: [a, b] }
    }

    /// Every valve at the same position.
    pub fn uniform(position: f64) -> Self {
        Self::new(position, position)
    }

    pub fn get(&self, valve: ValveId) -> f64 {
        self.positions[valve.index()]
    }

    pub fn set(&mut self, valve: ValveId, position: f64) {
        self.positions[valve.index()] = position;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValveId, f64)> + '_ {
        ValveId::ALL.into_iter().map(|v| (v, self.get(v)))
    }
}

/// Sink for valve commands.
pub trait ActuatorAdapter: Send {
    /// Drive `valve` to `position` (a fraction in `[0, 1]`).
    fn write(&mut self, valve: ValveId, position: f64) -> AdapterResult<()>;

    /// Drive every valve.
    ///
    /// A failure on one valve does not stop the others from being written;
    /// the first error is returned after all writes were attempted. This is
    /// what the fail-safe path relies on.
    fn write_all(&mut self, commands: &ValveCommands) -> AdapterResult<()> {
        let mut first_err = None;
        for (valve, position) in commands.iter() {
            if let Err(err) = self.write(valve, position) {
                tracing::warn!(%valve, %err, "valve write failed");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<A: ActuatorAdapter + ?Sized> ActuatorAdapter for Box<A> {
    fn write(&mut self, valve: ValveId, position: f64) -> AdapterResult<()> {
        (**self).write(valve, position)
    }

    fn write_all(&mut self, commands: &ValveCommands) -> AdapterResult<()> {
        (**self).write_all(commands)
    }
}

/// Raw analog output, one DAC channel per valve.
pub trait DacOutput: Send {
    fn set_code(&mut self, valve: ValveId, code: u16) -> AdapterResult<()>;
}

/// Actuator that drives valves through a DAC.
///
/// Positions are clamped to `[0, 1]` and truncated onto the DAC code range,
/// so 1.0 maps to [`DAC_FULL_SCALE`] and 0.5 to 32767.
pub struct DacActuator<D> {
    dac: D,
}

impl<D: DacOutput> DacActuator<D> {
    pub fn new(dac: D) -> Self {
        Self { dac }
    }

    pub fn code_for(position: f64) -> u16 {
        (position.clamp(0.0, 1.0) * f64::from(DAC_FULL_SCALE)) as u16
    }

    pub fn into_inner(self) -> D {
        self.dac
    }
}

impl<D: DacOutput> ActuatorAdapter for DacActuator<D> {
    fn write(&mut self, valve: ValveId, position: f64) -> AdapterResult<()> {
        if !position.is_finite() {
            return Err(AdapterError::InvalidCommand {
                valve,
                value: position,
            });
        }
        self.dac.set_code(valve, Self::code_for(position))
    }
}
