pub mod boost;
pub mod traits;

#[cfg(feature = "embedded")]
pub mod adc;

pub use boost::{BoostSensor, Reading};
pub use traits::{SensorError, VoltageSource};

#[cfg(feature = "embedded")]
pub use adc::AdcVoltage;
