//! Gauge controller
//!
//! Ties the boost sensor and the calibration store to the GATT service:
//! readings are published, control commands are applied and the calibration
//! is persisted periodically.

use core::cell::Cell;
use core::fmt;

use embedded_storage::Storage;
use log::{info, warn};

use crate::gatt::{ControlCommand, GaugeService, RadioStack, ServiceError};
use crate::sensor::{BoostSensor, Reading, SensorError, VoltageSource};
use crate::storage::{Calibration, CalibrationStore, StorageError};

/// Errors from one controller step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeError {
    Sensor(SensorError),
    Storage(StorageError),
    Service(ServiceError),
}

impl From<SensorError> for GaugeError {
    fn from(error: SensorError) -> Self {
        GaugeError::Sensor(error)
    }
}

impl From<StorageError> for GaugeError {
    fn from(error: StorageError) -> Self {
        GaugeError::Storage(error)
    }
}

impl From<ServiceError> for GaugeError {
    fn from(error: ServiceError) -> Self {
        GaugeError::Service(error)
    }
}

impl fmt::Display for GaugeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GaugeError::Sensor(e) => write!(f, "sensor: {}", e),
            GaugeError::Storage(e) => write!(f, "storage: {}", e),
            GaugeError::Service(e) => write!(f, "service: {}", e),
        }
    }
}

/// Holds the command raised by a service handler until the controller applies it.
///
/// Handlers run while the service is borrowed, so they only record the
/// command here.
#[derive(Default)]
pub struct PendingCommand(Cell<Option<ControlCommand>>);

impl PendingCommand {
    pub const fn new() -> Self {
        Self(Cell::new(None))
    }

    /// Record `command`, replacing any command not yet taken
    pub fn set(&self, command: ControlCommand) {
        self.0.set(Some(command));
    }

    pub fn take(&self) -> Option<ControlCommand> {
        self.0.take()
    }
}

/// Sensor and calibration owner
pub struct GaugeController<V: VoltageSource, S: Storage> {
    sensor: BoostSensor<V>,
    store: CalibrationStore<S>,
}

impl<V: VoltageSource, S: Storage> GaugeController<V, S> {
    pub fn new(sensor: BoostSensor<V>, store: CalibrationStore<S>) -> Self {
        Self { sensor, store }
    }

    /// Seed max pressure and zero offset from flash.
    ///
    /// Unreadable flash falls back to defaults so the gauge still runs.
    pub fn restore<R: RadioStack>(
        &mut self,
        service: &mut GaugeService<'_, R>,
    ) -> Result<Calibration, GaugeError> {
        let calibration = match self.store.load() {
            Ok(calibration) => calibration,
            Err(e) => {
                warn!("GAUGE: Using default calibration: {}", e);
                Calibration::default()
            }
        };

        service.set_max_pressure(calibration.max_pressure, false)?;
        self.sensor.set_zero_offset(calibration.zero_offset);
        Ok(calibration)
    }

    /// Take one sensor sample
    pub fn sample(&mut self) -> Result<(), GaugeError> {
        self.sensor.sample().map_err(GaugeError::from)
    }

    /// Publish the averaged reading and raise the peak if exceeded.
    ///
    /// Returns `None` when no samples were taken since the last update.
    pub fn update<R: RadioStack>(
        &mut self,
        service: &mut GaugeService<'_, R>,
    ) -> Result<Option<Reading>, GaugeError> {
        let Some(reading) = self.sensor.read() else {
            warn!("GAUGE: No samples since last update");
            return Ok(None);
        };

        service.set_pressure(reading.pressure_psi, true)?;
        service.set_sensor_voltage(reading.sensor_voltage, true)?;
        if reading.pressure_psi > service.max_pressure() {
            service.set_max_pressure(reading.pressure_psi, true)?;
        }

        Ok(Some(reading))
    }

    /// Carry out a control command
    pub fn apply<R: RadioStack>(
        &mut self,
        command: ControlCommand,
        service: &mut GaugeService<'_, R>,
    ) -> Result<(), GaugeError> {
        match command {
            ControlCommand::ZeroSensor => {
                self.sensor.zero(service.pressure());
                info!("GAUGE: Zeroed, offset now {} psi", self.sensor.zero_offset());
            }
            ControlCommand::ResetZeroing => {
                self.sensor.reset_zero_offset();
                info!("GAUGE: Zero offset cleared");
            }
            ControlCommand::ResetMaxPressure => {
                service.set_max_pressure(0.0, true)?;
                info!("GAUGE: Max pressure reset");
            }
        }
        Ok(())
    }

    /// Save the current peak and zero offset
    pub fn persist<R: RadioStack>(&mut self, service: &GaugeService<'_, R>) -> Result<(), GaugeError> {
        let calibration = Calibration {
            max_pressure: service.max_pressure(),
            zero_offset: self.sensor.zero_offset(),
        };
        self.store.save(&calibration).map_err(GaugeError::from)
    }

    pub fn sensor(&self) -> &BoostSensor<V> {
        &self.sensor
    }

    pub fn store(&self) -> &CalibrationStore<S> {
        &self.store
    }
}
