//! Error types for the lf-app service layer.

use lf_controls::ControlError;
use lf_core::TankId;
use lf_io::AdapterError;
use std::path::PathBuf;

/// Fault that ends a control run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Adapter fault: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Control fault on {tank}: {source}")]
    Control { tank: TankId, source: ControlError },
}

/// Application error type wrapping the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Control run failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<lf_project::ProjectError> for AppError {
    fn from(err: lf_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<lf_project::ValidationError> for AppError {
    fn from(err: lf_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ControlError> for AppError {
    fn from(err: ControlError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<lf_sim::SimError> for AppError {
    fn from(err: lf_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<lf_results::ResultsError> for AppError {
    fn from(err: lf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
