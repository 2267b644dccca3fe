use crate::{CoreError, CoreResult};

/// Floating point type used throughout the controller.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Two reference points spanning a linear scale, e.g. the voltages a sensor
/// produces at empty and full.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearSpan {
    min: Real,
    max: Real,
}

impl LinearSpan {
    pub fn new(min: Real, max: Real, what: &'static str) -> CoreResult<Self> {
        ensure_finite(min, what)?;
        ensure_finite(max, what)?;
        if min == max {
            return Err(CoreError::DegenerateRange { what, min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Real {
        self.min
    }

    pub fn max(&self) -> Real {
        self.max
    }

    pub fn width(&self) -> Real {
        self.max - self.min
    }

    /// Map `raw` onto the unit interval: `(raw - min) / (max - min)`.
    ///
    /// Values outside the span extrapolate; nothing is clamped.
    pub fn normalize(&self, raw: Real) -> Real {
        (raw - self.min) / self.width()
    }

    /// Inverse of [`normalize`](Self::normalize).
    pub fn denormalize(&self, fraction: Real) -> Real {
        self.min + fraction * self.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "level").unwrap_err();
        assert!(format!("{err}").contains("Non-finite"));
    }

    #[test]
    fn span_rejects_zero_width() {
        assert!(matches!(
            LinearSpan::new(1.0, 1.0, "tank"),
            Err(CoreError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn span_endpoints_map_to_unit_interval() {
        let span = LinearSpan::new(0.4020122684408, 1.992060792870876, "tank").unwrap();
        assert_eq!(span.normalize(span.min()), 0.0);
        assert!((span.normalize(span.max()) - 1.0).abs() < 1e-12);
        assert!((span.denormalize(0.5) - 1.1970365306558).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_inverts_denormalize(
            min in -10.0_f64..10.0,
            width in 0.01_f64..10.0,
            fraction in -0.5_f64..1.5,
        ) {
            let span = LinearSpan::new(min, min + width, "prop").unwrap();
            let back = span.normalize(span.denormalize(fraction));
            prop_assert!((back - fraction).abs() < 1e-9, "{} != {}", back, fraction);
        }
    }
}
