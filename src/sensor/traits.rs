//! Voltage source trait for abstraction and testability
//!
//! The boost sensor only needs a voltage; the ADC driver on the device and a
//! mock in tests both provide one.

use core::fmt;

/// Errors that can occur while reading the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Conversion did not complete
    ReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::ReadFailed => f.write_str("sensor read failed"),
        }
    }
}

/// Source of sensor input voltage
pub trait VoltageSource {
    /// Read the voltage at the ADC pin, in volts
    fn read_volts(&mut self) -> Result<f32, SensorError>;
}
