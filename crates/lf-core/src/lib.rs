//! lf-core: shared foundation for levelflow.
//!
//! Contains:
//! - units (uom voltage type and constructors)
//! - numeric (finite checks and two-point scaling)
//! - ids (tank, valve and sensor channel identifiers)
//! - timing (monotonic clocks and the cooperative stop signal)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use timing::{Clock, ManualClock, StopSignal, SystemClock};
pub use units::*;
