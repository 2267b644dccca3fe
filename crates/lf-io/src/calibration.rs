//! Two-point linear calibration of raw channel voltages.
//!
//! Each channel is characterised by the voltage it produces at the bottom and
//! top of its physical range. Readings in between are interpolated linearly;
//! readings outside extrapolate (a level sensor can legitimately read a little
//! below empty or above full, and clamping would hide a drifting sensor).

use crate::error::AdapterResult;
use lf_core::{ChannelId, LinearSpan, TankId, ValveId, Voltage, as_volts, volts};
use serde::{Deserialize, Serialize};

/// Engineering scale a channel reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// 0 at the low reference voltage, 100 at the high one.
    Percent,
    /// 0 at the low reference voltage, 1 at the high one.
    Fraction,
}

impl Scale {
    fn full_scale(self) -> f64 {
        match self {
            Scale::Percent => 100.0,
            Scale::Fraction => 1.0,
        }
    }
}

/// Calibration of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelCalibration {
    /// Voltage at the bottom of the range (empty tank, closed valve).
    pub v_min: f64,
    /// Voltage at the top of the range (full tank, open valve).
    pub v_max: f64,
    pub scale: Scale,
    /// Decimal places kept after scaling. `None` keeps full precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

impl ChannelCalibration {
    pub fn new(v_min: f64, v_max: f64, scale: Scale) -> AdapterResult<Self> {
        LinearSpan::new(v_min, v_max, "channel calibration")?;
        Ok(Self {
            v_min,
            v_max,
            scale,
            decimals: None,
        })
    }

    /// Round scaled values to `decimals` places.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    fn span(&self) -> AdapterResult<LinearSpan> {
        Ok(LinearSpan::new(self.v_min, self.v_max, "channel calibration")?)
    }

    /// Convert a raw voltage to engineering units.
    pub fn apply(&self, raw: Voltage) -> AdapterResult<f64> {
        let scaled = self.span()?.normalize(as_volts(raw)) * self.scale.full_scale();
        Ok(match self.decimals {
            Some(places) => round_to(scaled, places),
            None => scaled,
        })
    }

    /// Voltage the channel would produce for `value` in engineering units.
    pub fn invert(&self, value: f64) -> AdapterResult<Voltage> {
        let span = self.span()?;
        Ok(volts(span.denormalize(value / self.scale.full_scale())))
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Calibration for every channel on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub tank_levels: [ChannelCalibration; 2],
    pub valve_feedback: [ChannelCalibration; 2],
}

impl Calibration {
    /// Level transmitter output at an empty tank.
    pub const TANK_V_MIN: f64 = 0.4020122684408;
    /// Level transmitter output at a full tank.
    pub const TANK_V_MAX: f64 = 1.992060792870876;
    /// Valve position feedback at fully closed.
    pub const VALVE_V_MIN: f64 = 0.001;
    /// Valve position feedback at fully open.
    pub const VALVE_V_MAX: f64 = 2.96;

    /// Bench calibration of the reference rig.
    pub fn reference() -> Self {
        let level = ChannelCalibration {
            v_min: Self::TANK_V_MIN,
            v_max: Self::TANK_V_MAX,
            scale: Scale::Percent,
            decimals: Some(2),
        };
        let valve = ChannelCalibration {
            v_min: Self::VALVE_V_MIN,
            v_max: Self::VALVE_V_MAX,
            scale: Scale::Fraction,
            decimals: Some(3),
        };
        Self {
            tank_levels: [level; 2],
            valve_feedback: [valve; 2],
        }
    }

    pub fn level(&self, tank: TankId) -> &ChannelCalibration {
        &self.tank_levels[tank.index()]
    }

    pub fn valve(&self, valve: ValveId) -> &ChannelCalibration {
        &self.valve_feedback[valve.index()]
    }

    pub fn channel(&self, channel: ChannelId) -> &ChannelCalibration {
        match channel {
            ChannelId::TankLevel(tank) => self.level(tank),
            ChannelId::ValveFeedback(valve) => self.valve(valve),
        }
    }

    /// Check every channel has a usable span.
    pub fn validate(&self) -> AdapterResult<()> {
        for channel in ChannelId::ALL {
            self.channel(channel).span()?;
        }
        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdapterError;

    #[test]
    fn level_endpoints() {
        let cal = Calibration::reference();
        let level = cal.level(TankId::A);
        assert_eq!(level.apply(volts(Calibration::TANK_V_MIN)).unwrap(), 0.0);
        assert_eq!(level.apply(volts(Calibration::TANK_V_MAX)).unwrap(), 100.0);
    }

    #[test]
    fn valve_midpoint() {
        let cal = Calibration::reference();
        let mid = (Calibration::VALVE_V_MIN + Calibration::VALVE_V_MAX) / 2.0;
        assert_eq!(cal.valve(ValveId::B).apply(volts(mid)).unwrap(), 0.5);
    }

    #[test]
    fn out_of_range_extrapolates() {
        let cal = ChannelCalibration::new(1.0, 2.0, Scale::Percent).unwrap();
        assert!((cal.apply(volts(2.5)).unwrap() - 150.0).abs() < 1e-9);
        assert!((cal.apply(volts(0.5)).unwrap() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn rounding_applies_after_scaling() {
        let cal = ChannelCalibration::new(0.0, 1.0, Scale::Percent)
            .unwrap()
            .with_decimals(2);
        assert_eq!(cal.apply(volts(0.123456)).unwrap(), 12.35);
    }

    #[test]
    fn invert_round_trips_unrounded() {
        let cal = ChannelCalibration::new(0.4, 2.0, Scale::Percent).unwrap();
        let v = cal.invert(35.0).unwrap();
        assert!((cal.apply(v).unwrap() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_span_rejected() {
        assert!(matches!(
            ChannelCalibration::new(1.0, 1.0, Scale::Fraction),
            Err(AdapterError::Calibration(_))
        ));
        let mut cal = Calibration::reference();
        cal.valve_feedback[1].v_max = cal.valve_feedback[1].v_min;
        assert!(cal.validate().is_err());
    }
}
