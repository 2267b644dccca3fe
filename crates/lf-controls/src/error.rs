//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Non-positive or non-finite timestep handed to a controller.
    ///
    /// Always a clock or scheduling bug in the caller; never retried.
    #[error("Invalid control interval: dt = {dt} s (must be finite and positive)")]
    InvalidInterval { dt: f64 },

    /// Non-finite input value.
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
