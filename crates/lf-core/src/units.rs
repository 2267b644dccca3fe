use uom::si::electric_potential::volt;
use uom::si::f64::ElectricPotential;

/// Raw sensor and DAC voltages.
pub type Voltage = ElectricPotential;

#[inline]
pub fn volts(v: f64) -> Voltage {
    Voltage::new::<volt>(v)
}

#[inline]
pub fn as_volts(v: Voltage) -> f64 {
    v.get::<volt>()
}
