//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

pub trait Integrator {
    /// Advance `x` from `t` to `t + dt`.
    fn step<M: TransientModel>(&self, model: &M, t: f64, x: &M::State, dt: f64)
    -> SimResult<M::State>;
}

/// Classical 4th-order Runge-Kutta.
#[derive(Clone, Copy, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Explicit Euler. One rhs call per step.
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, 4 rhs calls per step).
    #[default]
    RK4,
    /// Forward Euler (1 rhs call per step).
    ForwardEuler,
}

impl IntegratorType {
    pub fn step<M: TransientModel>(
        self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        match self {
            IntegratorType::RK4 => RK4.step(model, t, x, dt),
            IntegratorType::ForwardEuler => ForwardEuler.step(model, t, x, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x_dot = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    fn integrate(kind: IntegratorType, dt: f64, t_end: f64) -> f64 {
        let mut x = Decay.initial_state();
        let mut t = 0.0;
        while t < t_end - 1e-12 {
            x = kind.step(&Decay, t, &x, dt).unwrap();
            t += dt;
        }
        x
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let x = integrate(IntegratorType::RK4, 0.1, 1.0);
        assert!((x - (-1.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn euler_is_first_order() {
        let coarse = (integrate(IntegratorType::ForwardEuler, 0.1, 1.0) - (-1.0f64).exp()).abs();
        let fine = (integrate(IntegratorType::ForwardEuler, 0.05, 1.0) - (-1.0f64).exp()).abs();
        assert!(fine < coarse);
        assert!(coarse / fine > 1.8 && coarse / fine < 2.2);
    }
}
