//! Application layer for levelflow.
//!
//! Ties the pieces together for the command line: loading and compiling a
//! project, running the control loop engine against the simulated plant,
//! and summarizing exported runs.

pub mod display;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod runtime_compile;

pub use display::{ChannelDisplay, DisplaySink, display_channel, format_record};
pub use engine::{
    ControlLoopEngine, CycleStats, EngineConfig, EngineState, RunIdentity, RunReport, StopReason,
    TankLoop,
};
pub use error::{AppError, AppResult, EngineError};
pub use metrics::{LoopMetrics, compute_loop_metrics};
pub use project_service::{load_project, save_project, validate_project};
pub use query::{
    RunSummary, extract_loop_series, get_run_summary, load_run_summary, upper_limits,
};
pub use run_service::{ClockMode, RunOptions, execute_run};
pub use runtime_compile::{build_calibration, build_loops, build_plant, engine_config};
