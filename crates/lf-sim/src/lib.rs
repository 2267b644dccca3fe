//! Simulated two-tank plant.
//!
//! Provides:
//! - Gravity-drained tank model with valve-fed inflow
//! - Valve actuator model with first-order dynamics and rate limiting
//! - Fixed-step RK4 and forward-Euler integrators
//! - A plant that sits behind the raw voltage / DAC seams of `lf-io`, so the
//!   calibrated adapters run unchanged against it

pub mod actuator;
pub mod error;
pub mod integrator;
pub mod model;
pub mod plant;
pub mod tanks;

pub use actuator::FirstOrderActuator;
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use model::TransientModel;
pub use plant::{PlantDac, PlantOptions, PlantSensor, SharedPlant, SimulatedPlant};
pub use tanks::{TankParams, TwoTankModel, TwoTankState};
