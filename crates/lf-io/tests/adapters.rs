use lf_core::{ChannelId, ManualClock, TankId, ValveId, Voltage, volts};
use lf_io::*;
use std::sync::Arc;
use std::time::Duration;

struct FixedVoltages([f64; 4]);

impl RawVoltageSource for FixedVoltages {
    fn sample(&mut self, channel: ChannelId) -> AdapterResult<Voltage> {
        Ok(volts(self.0[channel.index()]))
    }
}

struct BrokenChannel;

impl RawVoltageSource for BrokenChannel {
    fn sample(&mut self, channel: ChannelId) -> AdapterResult<Voltage> {
        Err(AdapterError::Read {
            channel,
            message: "bus timeout".into(),
        })
    }
}

#[test]
fn calibrated_sensor_scales_every_channel() {
    let clock = Arc::new(ManualClock::new());
    clock.advance(Duration::from_secs(7));
    let raw = FixedVoltages([
        Calibration::TANK_V_MIN,
        Calibration::TANK_V_MAX,
        Calibration::VALVE_V_MAX,
        Calibration::VALVE_V_MIN,
    ]);
    let mut sensor = CalibratedSensor::new(raw, Calibration::reference(), clock).unwrap();
    let reading = sensor.read().unwrap();

    assert_eq!(reading.captured_at, Duration::from_secs(7));
    assert_eq!(reading.level(TankId::A), 0.0);
    assert_eq!(reading.level(TankId::B), 100.0);
    assert_eq!(reading.valve_feedback(ValveId::A), 1.0);
    assert_eq!(reading.valve_feedback(ValveId::B), 0.0);
}

#[test]
fn source_error_propagates() {
    let clock = ManualClock::new();
    let mut sensor = CalibratedSensor::new(BrokenChannel, Calibration::reference(), clock).unwrap();
    assert!(matches!(sensor.read(), Err(AdapterError::Read { .. })));
}

#[test]
fn non_finite_voltage_is_an_invalid_reading() {
    let clock = ManualClock::new();
    let raw = FixedVoltages([1.0, f64::NAN, 1.0, 1.0]);
    let mut sensor = CalibratedSensor::new(raw, Calibration::reference(), clock).unwrap();
    match sensor.read() {
        Err(AdapterError::InvalidReading { channel, value }) => {
            assert_eq!(channel, ChannelId::TankLevel(TankId::B));
            assert!(value.is_nan());
        }
        other => panic!("expected invalid reading, got {other:?}"),
    }
}

/// DAC that fails on valve A and records everything it accepts.
#[derive(Default)]
struct FlakyDac {
    accepted: Vec<(ValveId, u16)>,
}

impl DacOutput for FlakyDac {
    fn set_code(&mut self, valve: ValveId, code: u16) -> AdapterResult<()> {
        if valve == ValveId::A {
            return Err(AdapterError::Write {
                valve,
                message: "nack".into(),
            });
        }
        self.accepted.push((valve, code));
        Ok(())
    }
}

#[test]
fn write_all_attempts_every_valve() {
    let mut actuator = DacActuator::new(FlakyDac::default());
    let result = actuator.write_all(&ValveCommands::uniform(1.0));

    assert!(matches!(
        result,
        Err(AdapterError::Write {
            valve: ValveId::A,
            ..
        })
    ));
    assert_eq!(
        actuator.into_inner().accepted,
        vec![(ValveId::B, DAC_FULL_SCALE)]
    );
}
