//! Gravity-drained tanks fed through proportional valves.
//!
//! Each tank is modelled in level percent:
//!
//! ```text
//! dL/dt = inflow_gain * valve - outflow_coefficient * sqrt(max(L, 0))
//! dv/dt = actuator lag toward the commanded opening
//! ```
//!
//! Torricelli outflow makes the open-loop steady state
//! `L* = (inflow_gain * valve / outflow_coefficient)^2`.

use crate::actuator::FirstOrderActuator;
use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use lf_core::{TankId, ValveId};

/// Physical parameters of one tank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankParams {
    /// Level rise rate with the inlet valve fully open and no outflow (%/s).
    pub inflow_gain: f64,
    /// Drain coefficient (%/s per sqrt(%)).
    pub outflow_coefficient: f64,
    /// Level at t=0 (%).
    pub initial_level: f64,
}

impl TankParams {
    pub fn new(inflow_gain: f64, outflow_coefficient: f64, initial_level: f64) -> SimResult<Self> {
        if !(inflow_gain > 0.0) || !inflow_gain.is_finite() {
            return Err(SimError::InvalidArg {
                what: "inflow_gain must be positive",
            });
        }
        if !(outflow_coefficient > 0.0) || !outflow_coefficient.is_finite() {
            return Err(SimError::InvalidArg {
                what: "outflow_coefficient must be positive",
            });
        }
        if !(0.0..=100.0).contains(&initial_level) {
            return Err(SimError::InvalidArg {
                what: "initial_level must be within 0..=100",
            });
        }
        Ok(Self {
            inflow_gain,
            outflow_coefficient,
            initial_level,
        })
    }

    /// Open-loop steady-state level for a constant valve opening.
    pub fn equilibrium_level(&self, valve: f64) -> f64 {
        let root = self.inflow_gain * valve / self.outflow_coefficient;
        root * root
    }

    /// Valve opening that holds `level` in steady state.
    pub fn holding_opening(&self, level: f64) -> f64 {
        self.outflow_coefficient * level.max(0.0).sqrt() / self.inflow_gain
    }
}

impl Default for TankParams {
    /// A tank that settles at 36 % with the valve half open.
    fn default() -> Self {
        Self {
            inflow_gain: 1.2,
            outflow_coefficient: 0.1,
            initial_level: 0.0,
        }
    }
}

/// Levels (%) and valve openings (fraction), indexed by tank.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TwoTankState {
    pub levels: [f64; 2],
    pub valves: [f64; 2],
}

impl TwoTankState {
    pub fn level(&self, tank: TankId) -> f64 {
        self.levels[tank.index()]
    }

    pub fn valve(&self, valve: ValveId) -> f64 {
        self.valves[valve.index()]
    }

    /// Pull the state back into the physical envelope after a step.
    fn clamp_physical(mut self) -> Self {
        for level in &mut self.levels {
            *level = level.clamp(0.0, 100.0);
        }
        for valve in &mut self.valves {
            *valve = valve.clamp(0.0, 1.0);
        }
        self
    }
}

/// Two independent tank/valve pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct TwoTankModel {
    tanks: [TankParams; 2],
    valve: FirstOrderActuator,
    commands: [f64; 2],
}

impl TwoTankModel {
    pub fn new(tanks: [TankParams; 2], valve: FirstOrderActuator) -> Self {
        Self {
            tanks,
            valve,
            commands: [0.0; 2],
        }
    }

    pub fn tank(&self, tank: TankId) -> &TankParams {
        &self.tanks[tank.index()]
    }

    pub fn command(&self, valve: ValveId) -> f64 {
        self.commands[valve.index()]
    }

    pub fn set_command(&mut self, valve: ValveId, position: f64) {
        self.commands[valve.index()] = position.clamp(0.0, 1.0);
    }

    /// Integrate one step and clamp the result to the physical envelope.
    pub(crate) fn step_clamped(
        &self,
        integrator: crate::IntegratorType,
        t: f64,
        x: &TwoTankState,
        dt: f64,
    ) -> SimResult<TwoTankState> {
        let next = integrator.step(self, t, x, dt)?;
        if next.levels.iter().chain(&next.valves).any(|v| !v.is_finite()) {
            return Err(SimError::NonPhysical {
                what: "tank state diverged",
            });
        }
        Ok(next.clamp_physical())
    }
}

impl Default for TwoTankModel {
    fn default() -> Self {
        Self::new(
            [TankParams::default(); 2],
            FirstOrderActuator {
                tau: 2.0,
                rate_limit: 0.5,
            },
        )
    }
}

impl TransientModel for TwoTankModel {
    type State = TwoTankState;

    fn initial_state(&self) -> TwoTankState {
        TwoTankState {
            levels: [self.tanks[0].initial_level, self.tanks[1].initial_level],
            valves: [0.0; 2],
        }
    }

    fn rhs(&self, _t: f64, x: &TwoTankState) -> SimResult<TwoTankState> {
        let mut dxdt = TwoTankState::default();
        for tank in TankId::ALL {
            let i = tank.index();
            let params = &self.tanks[i];
            let opening = x.valves[i].clamp(0.0, 1.0);
            let inflow = params.inflow_gain * opening;
            let outflow = params.outflow_coefficient * x.levels[i].max(0.0).sqrt();
            dxdt.levels[i] = inflow - outflow;
            dxdt.valves[i] = self.valve.dpdt(x.valves[i], self.commands[i]);
        }
        Ok(dxdt)
    }

    fn add(&self, a: &TwoTankState, b: &TwoTankState) -> TwoTankState {
        TwoTankState {
            levels: [a.levels[0] + b.levels[0], a.levels[1] + b.levels[1]],
            valves: [a.valves[0] + b.valves[0], a.valves[1] + b.valves[1]],
        }
    }

    fn scale(&self, a: &TwoTankState, scale: f64) -> TwoTankState {
        TwoTankState {
            levels: [a.levels[0] * scale, a.levels[1] * scale],
            valves: [a.valves[0] * scale, a.valves[1] * scale],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equilibrium_and_holding_opening_agree() {
        let tank = TankParams::default();
        assert!((tank.equilibrium_level(0.5) - 36.0).abs() < 1e-9);
        assert!((tank.holding_opening(36.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn derivative_is_zero_at_equilibrium() {
        let mut model = TwoTankModel::default();
        model.set_command(ValveId::A, 0.5);
        model.set_command(ValveId::B, 0.5);
        let x = TwoTankState {
            levels: [36.0, 36.0],
            valves: [0.5, 0.5],
        };
        let dxdt = model.rhs(0.0, &x).unwrap();
        for v in dxdt.levels.iter().chain(&dxdt.valves) {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn empty_tank_with_closed_valve_stays_empty() {
        let model = TwoTankModel::default();
        let x = model.initial_state();
        let dxdt = model.rhs(0.0, &x).unwrap();
        assert_eq!(dxdt, TwoTankState::default());
    }

    #[test]
    fn invalid_tank_rejected() {
        assert!(TankParams::new(0.0, 0.1, 0.0).is_err());
        assert!(TankParams::new(1.0, -0.1, 0.0).is_err());
        assert!(TankParams::new(1.0, 0.1, 120.0).is_err());
    }
}
