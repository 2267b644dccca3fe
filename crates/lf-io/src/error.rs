//! Error types for sensor and actuator adapters.

use lf_core::{ChannelId, CoreError, ValveId};
use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failure talking to, or interpreting data from, the rig.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Sensor read failed on {channel}: {message}")]
    Read { channel: ChannelId, message: String },

    #[error("Actuator write failed on {valve}: {message}")]
    Write { valve: ValveId, message: String },

    #[error("Invalid reading on {channel}: {value}")]
    InvalidReading { channel: ChannelId, value: f64 },

    #[error("Invalid command for {valve}: {value}")]
    InvalidCommand { valve: ValveId, value: f64 },

    #[error("Calibration error: {0}")]
    Calibration(#[from] CoreError),
}
