#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod gatt;
pub mod gauge;
pub mod sensor;
pub mod storage;

// These modules depend on embassy/async features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod tasks;
