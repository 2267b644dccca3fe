//! Sensor side of the rig.

use crate::calibration::Calibration;
use crate::error::{AdapterError, AdapterResult};
use crate::reading::ProcessReading;
use lf_core::{ChannelId, Clock, Voltage};

/// Source of calibrated process readings.
///
/// Implementations may block on I/O; the control loop calls [`read`] once per
/// iteration and treats any error as fatal.
///
/// [`read`]: SensorAdapter::read
pub trait SensorAdapter: Send {
    /// Sample every channel.
    fn read(&mut self) -> AdapterResult<ProcessReading>;
}

impl<S: SensorAdapter + ?Sized> SensorAdapter for Box<S> {
    fn read(&mut self) -> AdapterResult<ProcessReading> {
        (**self).read()
    }
}

/// Raw analog input, one voltage per channel.
pub trait RawVoltageSource: Send {
    fn sample(&mut self, channel: ChannelId) -> AdapterResult<Voltage>;
}

/// Sensor that samples raw voltages and applies a [`Calibration`].
///
/// Readings are stamped with the clock time taken just before the first
/// channel is sampled.
pub struct CalibratedSensor<R, C> {
    source: R,
    calibration: Calibration,
    clock: C,
}

impl<R: RawVoltageSource, C: Clock> CalibratedSensor<R, C> {
    pub fn new(source: R, calibration: Calibration, clock: C) -> AdapterResult<Self> {
        calibration.validate()?;
        Ok(Self {
            source,
            calibration,
            clock,
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}

impl<R: RawVoltageSource, C: Clock> SensorAdapter for CalibratedSensor<R, C> {
    fn read(&mut self) -> AdapterResult<ProcessReading> {
        let captured_at = self.clock.now();
        let mut values = [0.0; 4];
        for channel in ChannelId::ALL {
            let raw = self.source.sample(channel)?;
            let value = self.calibration.channel(channel).apply(raw)?;
            if !value.is_finite() {
                return Err(AdapterError::InvalidReading { channel, value });
            }
            values[channel.index()] = value;
        }
        Ok(ProcessReading::new(captured_at, values))
    }
}
