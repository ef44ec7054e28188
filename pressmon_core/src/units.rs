//! ADC count -> voltage -> loop current -> pressure.

use crate::error::BuildError;

/// Linear conversion chain for the 4-20 mA style transmitters behind the ADC.
///
/// All constants are positive and finite; `new` enforces it so the
/// conversions themselves never fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    adc_max: f64,
    v_ref: f64,
    i_max: f64,
    p_max: f64,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            adc_max: 4095.0,
            v_ref: 3.0,
            i_max: 20.0,
            p_max: 40.0,
        }
    }
}

impl UnitConverter {
    pub fn new(adc_max: f64, v_ref: f64, i_max: f64, p_max: f64) -> Result<Self, BuildError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(adc_max) {
            return Err(BuildError::InvalidConfig("adc_max must be finite and > 0"));
        }
        if !ok(v_ref) {
            return Err(BuildError::InvalidConfig("v_ref must be finite and > 0"));
        }
        if !ok(i_max) {
            return Err(BuildError::InvalidConfig("i_max must be finite and > 0"));
        }
        if !ok(p_max) {
            return Err(BuildError::InvalidConfig("p_max must be finite and > 0"));
        }
        Ok(Self {
            adc_max,
            v_ref,
            i_max,
            p_max,
        })
    }

    pub fn adc_max(&self) -> f64 {
        self.adc_max
    }

    pub fn p_max(&self) -> f64 {
        self.p_max
    }

    #[inline]
    pub fn adc_to_voltage(&self, count: f64) -> f64 {
        (count / self.adc_max) * self.v_ref
    }

    #[inline]
    pub fn voltage_to_current(&self, volts: f64) -> f64 {
        (volts / self.v_ref) * self.i_max
    }

    #[inline]
    pub fn current_to_pressure(&self, milliamps: f64) -> f64 {
        (milliamps / self.i_max) * self.p_max
    }

    #[inline]
    pub fn adc_to_physical(&self, count: f64) -> f64 {
        self.current_to_pressure(self.voltage_to_current(self.adc_to_voltage(count)))
    }
}
