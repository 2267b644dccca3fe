use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Degenerate range for {what}: min={min}, max={max}")]
    DegenerateRange {
        what: &'static str,
        min: f64,
        max: f64,
    },
}
