//! Feedback control primitives for levelflow.
//!
//! This crate holds the pieces of a control loop that carry numerical state or
//! timing rules but no I/O:
//! - [`PidController`]: derivative-on-measurement PID with output clamping and
//!   anti-windup
//! - [`SetpointProfile`]: time-scheduled setpoints, including the disturbance
//!   profile used to exercise a tuned loop
//! - [`SampleConfig`]: nominal loop period and the remaining-sleep rule
//!
//! Everything here is a pure function of its inputs and its own state, so a
//! recorded run can be replayed exactly.

pub mod controller;
pub mod error;
pub mod sampled;
pub mod setpoint;

pub use controller::{OutputLimits, PidComponents, PidController, PidGains};
pub use error::{ControlError, ControlResult};
pub use sampled::SampleConfig;
pub use setpoint::{SetpointProfile, Transition, Waveform};
