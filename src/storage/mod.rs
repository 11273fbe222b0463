pub mod calibration;

pub use calibration::{Calibration, CalibrationStore, StorageError};
