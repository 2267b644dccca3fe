//! Error types for the simulated plant.

use thiserror::Error;

/// Errors encountered while simulating the plant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<lf_io::AdapterError> for SimError {
    fn from(e: lf_io::AdapterError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
