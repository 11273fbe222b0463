//! Embassy tasks module
//!
//! Contains all async tasks for the firmware, organised by functionality.

pub mod ble;
pub mod gauge;

pub use ble::ble_task;
pub use gauge::gauge_task;
