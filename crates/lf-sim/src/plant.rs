//! Plant that stands in for the rig behind the raw I/O seams.
//!
//! [`SimulatedPlant`] integrates the tank model in fixed sub-steps up to
//! whatever time it is asked about. [`SharedPlant`] couples it to a [`Clock`]
//! and hands out the two halves the adapters need:
//! - [`PlantSensor`], a [`RawVoltageSource`] producing calibrated-range
//!   voltages (optionally with seeded uniform noise)
//! - [`PlantDac`], a [`DacOutput`] accepting native DAC codes
//!
//! Both halves bring the plant up to the clock's current time before touching
//! it, so the plant evolves in step with the control loop whether the clock is
//! real or virtual.

use crate::error::{SimError, SimResult};
use crate::integrator::IntegratorType;
use crate::model::TransientModel;
use crate::tanks::{TwoTankModel, TwoTankState};
use lf_core::{ChannelId, Clock, ValveId, Voltage, as_volts, volts};
use lf_io::{
    AdapterError, AdapterResult, Calibration, DAC_FULL_SCALE, DacOutput, RawVoltageSource,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Integration and sensor options for the plant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantOptions {
    /// Largest integration step (seconds).
    pub substep: f64,
    pub integrator: IntegratorType,
    /// Half-width of uniform noise added to every raw voltage (volts).
    pub noise_volts: f64,
    pub seed: u64,
}

impl Default for PlantOptions {
    fn default() -> Self {
        Self {
            substep: 0.1,
            integrator: IntegratorType::RK4,
            noise_volts: 0.0,
            seed: 0,
        }
    }
}

/// Tank model plus its integration state.
pub struct SimulatedPlant {
    model: TwoTankModel,
    state: TwoTankState,
    t: f64,
    options: PlantOptions,
    calibration: Calibration,
    rng: StdRng,
}

impl SimulatedPlant {
    pub fn new(
        model: TwoTankModel,
        calibration: Calibration,
        options: PlantOptions,
    ) -> SimResult<Self> {
        if !(options.substep > 0.0) || !options.substep.is_finite() {
            return Err(SimError::InvalidArg {
                what: "substep must be positive",
            });
        }
        if !(options.noise_volts >= 0.0) || !options.noise_volts.is_finite() {
            return Err(SimError::InvalidArg {
                what: "noise_volts must be finite and non-negative",
            });
        }
        calibration.validate()?;
        let state = model.initial_state();
        Ok(Self {
            model,
            state,
            t: 0.0,
            options,
            calibration,
            rng: StdRng::seed_from_u64(options.seed),
        })
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> &TwoTankState {
        &self.state
    }

    pub fn model(&self) -> &TwoTankModel {
        &self.model
    }

    pub fn set_command(&mut self, valve: ValveId, position: f64) {
        self.model.set_command(valve, position);
    }

    /// Integrate up to `t`. Times in the past are ignored.
    pub fn advance_to(&mut self, t: f64) -> SimResult<()> {
        while self.t < t {
            let next = (self.t + self.options.substep).min(t);
            self.state =
                self.model
                    .step_clamped(self.options.integrator, self.t, &self.state, next - self.t)?;
            self.t = next;
        }
        Ok(())
    }

    /// Voltage currently present on `channel`.
    pub fn voltage(&mut self, channel: ChannelId) -> SimResult<Voltage> {
        let value = match channel {
            ChannelId::TankLevel(tank) => self.state.level(tank),
            ChannelId::ValveFeedback(valve) => self.state.valve(valve),
        };
        let clean = self.calibration.channel(channel).invert(value)?;
        if self.options.noise_volts == 0.0 {
            return Ok(clean);
        }
        let n = self.options.noise_volts;
        Ok(volts(as_volts(clean) + self.rng.gen_range(-n..=n)))
    }
}

/// [`SimulatedPlant`] shared between its sensor and DAC halves.
pub struct SharedPlant<C> {
    inner: Arc<Mutex<SimulatedPlant>>,
    clock: C,
}

impl<C: Clock + Clone> Clone for SharedPlant<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock + Clone> SharedPlant<C> {
    pub fn new(plant: SimulatedPlant, clock: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(plant)),
            clock,
        }
    }

    pub fn sensor(&self) -> PlantSensor<C> {
        PlantSensor {
            plant: self.clone(),
        }
    }

    pub fn dac(&self) -> PlantDac<C> {
        PlantDac {
            plant: self.clone(),
        }
    }

    /// Current plant state, brought up to the clock first.
    pub fn snapshot(&self) -> SimResult<TwoTankState> {
        self.with_synced(|plant| Ok(*plant.state()))
    }

    fn with_synced<T>(&self, f: impl FnOnce(&mut SimulatedPlant) -> SimResult<T>) -> SimResult<T> {
        let mut plant = self.inner.lock();
        plant.advance_to(self.clock.now().as_secs_f64())?;
        f(&mut plant)
    }
}

/// Analog inputs of the simulated rig.
pub struct PlantSensor<C> {
    plant: SharedPlant<C>,
}

impl<C: Clock + Clone> RawVoltageSource for PlantSensor<C> {
    fn sample(&mut self, channel: ChannelId) -> AdapterResult<Voltage> {
        self.plant
            .with_synced(|plant| plant.voltage(channel))
            .map_err(|e| AdapterError::Read {
                channel,
                message: e.to_string(),
            })
    }
}

/// Valve DAC of the simulated rig.
pub struct PlantDac<C> {
    plant: SharedPlant<C>,
}

impl<C: Clock + Clone> DacOutput for PlantDac<C> {
    fn set_code(&mut self, valve: ValveId, code: u16) -> AdapterResult<()> {
        let position = f64::from(code) / f64::from(DAC_FULL_SCALE);
        self.plant
            .with_synced(|plant| {
                plant.set_command(valve, position);
                Ok(())
            })
            .map_err(|e| AdapterError::Write {
                valve,
                message: e.to_string(),
            })?;
        tracing::trace!(%valve, code, "plant valve command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::TankId;

    fn plant(options: PlantOptions) -> SimulatedPlant {
        SimulatedPlant::new(TwoTankModel::default(), Calibration::reference(), options).unwrap()
    }

    #[test]
    fn advance_uses_partial_final_substep() {
        let mut p = plant(PlantOptions::default());
        p.advance_to(0.25).unwrap();
        assert!((p.time() - 0.25).abs() < 1e-12);
        p.advance_to(0.1).unwrap();
        assert!((p.time() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_tank_reads_low_reference_voltage() {
        let mut p = plant(PlantOptions::default());
        let v = p.voltage(ChannelId::TankLevel(TankId::A)).unwrap();
        assert!((as_volts(v) - Calibration::TANK_V_MIN).abs() < 1e-12);
    }

    #[test]
    fn noise_is_bounded_and_seeded() {
        let options = PlantOptions {
            noise_volts: 0.01,
            seed: 7,
            ..PlantOptions::default()
        };
        let mut a = plant(options);
        let mut b = plant(options);
        for _ in 0..100 {
            let va = as_volts(a.voltage(ChannelId::TankLevel(TankId::B)).unwrap());
            let vb = as_volts(b.voltage(ChannelId::TankLevel(TankId::B)).unwrap());
            assert_eq!(va, vb);
            assert!((va - Calibration::TANK_V_MIN).abs() <= 0.01 + 1e-12);
        }
    }

    #[test]
    fn invalid_options_rejected() {
        let bad = PlantOptions {
            substep: 0.0,
            ..PlantOptions::default()
        };
        assert!(
            SimulatedPlant::new(TwoTankModel::default(), Calibration::reference(), bad).is_err()
        );
    }
}
