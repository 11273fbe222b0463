//! ADC-backed voltage source
//!
//! One-shot reads on ADC1 with curve calibration, so the raw result is
//! already in millivolts.

use crate::sensor::traits::{SensorError, VoltageSource};
use esp_hal::analog::adc::{Adc, AdcCalCurve, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO4};
use esp_hal::Blocking;

type CalibratedPin<'d> = AdcPin<GPIO4<'d>, ADC1<'d>, AdcCalCurve<ADC1<'d>>>;

/// Sensor input on GPIO4
pub struct AdcVoltage<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: CalibratedPin<'d>,
}

impl<'d> AdcVoltage<'d> {
    pub fn new(adc1: ADC1<'d>, gpio: GPIO4<'d>) -> Self {
        let mut config = AdcConfig::new();
        // 11 dB covers the full 0-3.1 V input range
        let pin = config.enable_pin_with_cal::<_, AdcCalCurve<ADC1<'d>>>(gpio, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        Self { adc, pin }
    }
}

impl VoltageSource for AdcVoltage<'_> {
    fn read_volts(&mut self) -> Result<f32, SensorError> {
        let millivolts = nb::block!(self.adc.read_oneshot(&mut self.pin))
            .map_err(|_| SensorError::ReadFailed)?;
        Ok(millivolts as f32 / 1000.0)
    }
}
