use lf_core::{ChannelId, TankId, ValveId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One calibrated sample of every channel, taken together.
///
/// Levels are percent-full; valve feedback is the measured opening as a
/// fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessReading {
    /// Clock time at which the sample was taken.
    pub captured_at: Duration,
    /// Values indexed by [`ChannelId::index`].
    values: [f64; 4],
}

impl ProcessReading {
    pub fn new(captured_at: Duration, values: [f64; 4]) -> Self {
        Self {
            captured_at,
            values,
        }
    }

    /// Build a reading from per-tank levels and per-valve feedback.
    pub fn from_parts(captured_at: Duration, levels: [f64; 2], valves: [f64; 2]) -> Self {
        Self::new(captured_at, [levels[0], levels[1], valves[0], valves[1]])
    }

    pub fn get(&self, channel: ChannelId) -> f64 {
        self.values[channel.index()]
    }

    pub fn level(&self, tank: TankId) -> f64 {
        self.get(ChannelId::TankLevel(tank))
    }

    pub fn valve_feedback(&self, valve: ValveId) -> f64 {
        self.get(ChannelId::ValveFeedback(valve))
    }

    /// `(channel, value)` pairs in ADC order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, f64)> + '_ {
        ChannelId::ALL.into_iter().map(|ch| (ch, self.get(ch)))
    }

    /// First channel whose value is NaN or infinite.
    pub fn first_non_finite(&self) -> Option<(ChannelId, f64)> {
        self.iter().find(|(_, v)| !v.is_finite())
    }
}
