pub mod controller;

pub use controller::{GaugeController, GaugeError, PendingCommand};
