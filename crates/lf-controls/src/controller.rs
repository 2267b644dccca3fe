//! PID controller.
//!
//! Parallel-form PID with the two refinements a level loop needs:
//! - **Derivative on measurement**: the D term sees `-d(measurement)/dt`, so a
//!   setpoint step or a scheduled setpoint waveform never kicks the output.
//! - **Anti-windup**: the integral is held while the output is already pinned
//!   in the direction the error pushes, and its contribution is clamped to the
//!   output limits. A loop that sat saturated for an hour recovers on the first
//!   sample after the error changes sign.
//!
//! The controller owns its setpoint. Changing it takes effect on the next
//! [`PidController::compute`] and leaves the integral untouched.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain (output per unit error).
    pub kp: f64,
    /// Integral gain (output per unit error-second).
    pub ki: f64,
    /// Derivative gain (output per unit measurement rate, seconds).
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        for (gain, what) in [
            (kp, "kp must be finite and non-negative"),
            (ki, "ki must be finite and non-negative"),
            (kd, "kd must be finite and non-negative"),
        ] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ControlError::InvalidArg { what });
            }
        }
        Ok(Self { kp, ki, kd })
    }
}

/// Closed interval the controller output is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLimits {
    pub min: f64,
    pub max: f64,
}

impl OutputLimits {
    pub fn new(min: f64, max: f64) -> ControlResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "output limits must be finite",
            });
        }
        if min >= max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self { min, max })
    }

    /// Full valve travel.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Contribution of each term to the most recent output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidComponents {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

/// Stateful PID controller for one loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    gains: PidGains,
    limits: OutputLimits,
    setpoint: f64,
    /// Accumulated error-seconds.
    integral: f64,
    previous_measurement: Option<f64>,
    components: PidComponents,
}

impl PidController {
    /// Create a controller with zero integral and no measurement history.
    pub fn new(gains: PidGains, limits: OutputLimits, setpoint: f64) -> Self {
        Self {
            gains,
            limits,
            setpoint,
            integral: 0.0,
            previous_measurement: None,
            components: PidComponents::default(),
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Install a new setpoint for the next `compute`.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// Accumulated integral of error over time.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Terms behind the most recent output.
    pub fn components(&self) -> PidComponents {
        self.components
    }

    /// Forget the integral and the measurement history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_measurement = None;
        self.components = PidComponents::default();
    }

    /// Compute the controller output for `measurement`, `dt` seconds after the
    /// previous call.
    ///
    /// # Errors
    ///
    /// - [`ControlError::InvalidInterval`] if `dt` is not finite and positive.
    /// - [`ControlError::NonFinite`] if the measurement or setpoint is NaN/inf.
    ///
    /// On error the controller state is unchanged.
    pub fn compute(&mut self, measurement: f64, dt: f64) -> ControlResult<f64> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::InvalidInterval { dt });
        }
        if !measurement.is_finite() {
            return Err(ControlError::NonFinite {
                what: "measurement",
                value: measurement,
            });
        }
        if !self.setpoint.is_finite() {
            return Err(ControlError::NonFinite {
                what: "setpoint",
                value: self.setpoint,
            });
        }

        let PidGains { kp, ki, kd } = self.gains;
        let error = self.setpoint - measurement;

        let p_term = kp * error;

        // First sample has no history: no derivative action.
        let d_term = match self.previous_measurement {
            Some(previous) => -kd * (measurement - previous) / dt,
            None => 0.0,
        };

        // Hold the integral while the output is already pinned on the side
        // the error is pushing toward.
        let raw_before = p_term + ki * self.integral + d_term;
        let pinned_high = raw_before >= self.limits.max && error > 0.0;
        let pinned_low = raw_before <= self.limits.min && error < 0.0;
        let mut integral = if pinned_high || pinned_low {
            self.integral
        } else {
            self.integral + error * dt
        };
        if ki > 0.0 {
            integral = integral.clamp(self.limits.min / ki, self.limits.max / ki);
        }
        let i_term = ki * integral;

        let output = self.limits.clamp(p_term + i_term + d_term);

        self.integral = integral;
        self.previous_measurement = Some(measurement);
        self.components = PidComponents {
            proportional: p_term,
            integral: i_term,
            derivative: d_term,
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank_pid(setpoint: f64) -> PidController {
        PidController::new(
            PidGains::new(0.08, 0.005, 0.0005).unwrap(),
            OutputLimits::unit(),
            setpoint,
        )
    }

    #[test]
    fn equilibrium_gives_zero_output() {
        let mut pid = tank_pid(35.0);
        for _ in 0..5 {
            let out = pid.compute(35.0, 1.0).unwrap();
            assert_eq!(out, 0.0);
        }
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn proportional_only() {
        let mut pid = PidController::new(
            PidGains::new(0.1, 0.0, 0.0).unwrap(),
            OutputLimits::unit(),
            35.0,
        );
        let out = pid.compute(30.0, 1.0).unwrap();
        assert!((out - 0.5).abs() < 1e-12);
    }

    #[test]
    fn output_is_clamped() {
        let mut pid = tank_pid(100.0);
        assert_eq!(pid.compute(0.0, 1.0).unwrap(), 1.0);

        let mut pid = tank_pid(0.0);
        assert_eq!(pid.compute(100.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn saturated_high_for_long_keeps_integral_bounded() {
        let mut pid = tank_pid(100.0);
        for _ in 0..1000 {
            let out = pid.compute(0.0, 1.0).unwrap();
            assert_eq!(out, 1.0);
        }
        let i_term = pid.gains().ki * pid.integral();
        assert!(i_term <= pid.limits().max + 1e-12);
        assert!(pid.integral().abs() < 1e3);
    }

    #[test]
    fn recovers_immediately_after_long_saturation() {
        // Weak P so the integral is what drives saturation.
        let mut pid = PidController::new(
            PidGains::new(0.001, 0.5, 0.0).unwrap(),
            OutputLimits::unit(),
            50.0,
        );
        for _ in 0..1000 {
            pid.compute(40.0, 1.0).unwrap();
        }
        assert_eq!(pid.compute(40.0, 1.0).unwrap(), 1.0);
        assert!(pid.integral() <= 1.0 / 0.5 + 1e-12);

        // Level overshoots slightly: output must leave the rail right away.
        let out = pid.compute(51.0, 1.0).unwrap();
        assert!(out < 1.0, "output stayed pinned at {out}");
    }

    #[test]
    fn setpoint_step_has_no_derivative_kick() {
        let mut pid = PidController::new(
            PidGains::new(0.0, 0.0, 10.0).unwrap(),
            OutputLimits::new(-100.0, 100.0).unwrap(),
            35.0,
        );
        pid.compute(35.0, 1.0).unwrap();
        pid.set_setpoint(51.0);
        let out = pid.compute(35.0, 1.0).unwrap();
        assert_eq!(out, 0.0);
        assert_eq!(pid.components().derivative, 0.0);
    }

    #[test]
    fn derivative_opposes_rising_measurement() {
        let mut pid = PidController::new(
            PidGains::new(0.0, 0.0, 1.0).unwrap(),
            OutputLimits::new(-10.0, 10.0).unwrap(),
            35.0,
        );
        pid.compute(30.0, 1.0).unwrap();
        let out = pid.compute(32.0, 0.5).unwrap();
        assert!((out - (-4.0)).abs() < 1e-12);
    }

    #[test]
    fn setpoint_change_keeps_integral() {
        let mut pid = tank_pid(35.0);
        pid.compute(34.0, 1.0).unwrap();
        let before = pid.integral();
        assert!(before > 0.0);
        pid.set_setpoint(40.0);
        assert_eq!(pid.integral(), before);
    }

    #[test]
    fn non_positive_dt_is_rejected() {
        let mut pid = tank_pid(35.0);
        assert_eq!(
            pid.compute(30.0, 0.0),
            Err(ControlError::InvalidInterval { dt: 0.0 })
        );
        assert!(matches!(
            pid.compute(30.0, -1.0),
            Err(ControlError::InvalidInterval { .. })
        ));
        assert!(matches!(
            pid.compute(30.0, f64::NAN),
            Err(ControlError::InvalidInterval { .. })
        ));
        // Rejected calls leave no trace.
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn nan_measurement_is_rejected() {
        let mut pid = tank_pid(35.0);
        assert!(matches!(
            pid.compute(f64::NAN, 1.0),
            Err(ControlError::NonFinite { .. })
        ));
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = tank_pid(35.0);
        pid.compute(20.0, 1.0).unwrap();
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.components(), PidComponents::default());
    }

    #[test]
    fn invalid_parameters() {
        assert!(PidGains::new(-0.1, 0.0, 0.0).is_err());
        assert!(PidGains::new(0.1, f64::INFINITY, 0.0).is_err());
        assert!(OutputLimits::new(1.0, 0.0).is_err());
        assert!(OutputLimits::new(0.5, 0.5).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_never_leaves_limits(
            kp in 0.0_f64..50.0,
            ki in 0.0_f64..50.0,
            kd in 0.0_f64..50.0,
            setpoint in -100.0_f64..200.0,
            steps in prop::collection::vec((-1.0e3_f64..1.0e3, 1.0e-3_f64..10.0), 1..200),
        ) {
            let limits = OutputLimits::unit();
            let mut pid = PidController::new(PidGains::new(kp, ki, kd).unwrap(), limits, setpoint);
            for (measurement, dt) in steps {
                let out = pid.compute(measurement, dt).unwrap();
                prop_assert!(limits.contains(out), "output {} outside limits", out);
            }
        }
    }
}
