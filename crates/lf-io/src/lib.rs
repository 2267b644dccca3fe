//! Sensor and actuator adapters for the two-tank rig.
//!
//! The controller core only sees two seams:
//! - [`SensorAdapter::read`] returning a calibrated [`ProcessReading`]
//! - [`ActuatorAdapter::write`] taking a normalized valve command in `[0, 1]`
//!
//! Below those seams this crate provides the calibrated implementations that
//! sit on top of raw hardware access:
//! - [`CalibratedSensor`] turns raw channel voltages into percent / fraction
//!   using two-point linear calibration
//! - [`DacActuator`] maps a valve fraction onto the DAC's native code range
//!
//! Raw hardware access itself ([`RawVoltageSource`], [`DacOutput`]) is
//! implemented by whatever drives the bus, or by the simulated plant.

pub mod actuator;
pub mod calibration;
pub mod error;
pub mod reading;
pub mod sensor;

pub use actuator::{ActuatorAdapter, DAC_FULL_SCALE, DacActuator, DacOutput, ValveCommands};
pub use calibration::{Calibration, ChannelCalibration, Scale};
pub use error::{AdapterError, AdapterResult};
pub use reading::ProcessReading;
pub use sensor::{CalibratedSensor, RawVoltageSource, SensorAdapter};
