//! Boost pressure sensor
//!
//! A ratiometric absolute pressure sensor on a 5 V supply, read through a
//! 2:1 resistor divider. Samples are averaged between readings and the zero
//! offset is applied to the converted pressure.

use crate::config::sensor::{ATMOSPHERIC_KPA, DIVIDER_RATIO, KPA_PER_PSI, VCC};
use crate::sensor::traits::{SensorError, VoltageSource};
use log::warn;

/// Sensor output voltage from the voltage seen at the ADC pin
pub fn vin_to_sensor_vout(vin: f32) -> f32 {
    vin * DIVIDER_RATIO
}

/// Gauge pressure in psi from the sensor output voltage
pub fn vout_to_psi(vout: f32, vcc: f32) -> f32 {
    let pressure_kpa = (vout + vcc * 0.04) / (vcc * 0.004);
    (pressure_kpa - ATMOSPHERIC_KPA) / KPA_PER_PSI
}

/// One averaged reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Gauge pressure in psi, zero offset applied
    pub pressure_psi: f32,
    /// Averaged voltage at the ADC pin
    pub sensor_voltage: f32,
}

/// Averaging boost sensor
pub struct BoostSensor<V: VoltageSource> {
    source: V,
    sum: f32,
    count: u32,
    zero_offset: f32,
}

impl<V: VoltageSource> BoostSensor<V> {
    pub fn new(source: V) -> Self {
        Self {
            source,
            sum: 0.0,
            count: 0,
            zero_offset: 0.0,
        }
    }

    /// Accumulate one voltage sample
    pub fn sample(&mut self) -> Result<(), SensorError> {
        match self.source.read_volts() {
            Ok(volts) => {
                self.sum += volts;
                self.count += 1;
                Ok(())
            }
            Err(e) => {
                warn!("SENSOR: Sample dropped: {}", e);
                Err(e)
            }
        }
    }

    /// Average the accumulated samples and start a new window.
    ///
    /// Returns `None` when nothing was sampled since the last read.
    pub fn read(&mut self) -> Option<Reading> {
        if self.count == 0 {
            return None;
        }

        let avg_vin = self.sum / self.count as f32;
        self.sum = 0.0;
        self.count = 0;

        let pressure = vout_to_psi(vin_to_sensor_vout(avg_vin), VCC);
        Some(Reading {
            pressure_psi: pressure + self.zero_offset,
            sensor_voltage: avg_vin,
        })
    }

    /// Number of samples waiting to be averaged
    pub fn pending(&self) -> u32 {
        self.count
    }

    /// Shift the offset so `current_pressure` reads as zero
    pub fn zero(&mut self, current_pressure: f32) {
        self.zero_offset -= current_pressure;
    }

    pub fn reset_zero_offset(&mut self) {
        self.zero_offset = 0.0;
    }

    pub fn set_zero_offset(&mut self, offset: f32) {
        self.zero_offset = offset;
    }

    pub fn zero_offset(&self) -> f32 {
        self.zero_offset
    }
}
