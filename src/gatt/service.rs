//! Boost gauge GATT service
//!
//! [`GaugeService`] owns the radio stack, the attribute handles, the
//! connection registry and the command handlers. It is driven from two sides:
//!
//! - the radio, through [`GaugeService::handle_event`]
//! - the application, through the telemetry setters and getters
//!
//! Only one instance exists per radio: the service takes the radio by value
//! and the radio holds a single attribute table.

use core::fmt::{self, Write};

use heapless::String;
use log::{debug, info, warn};

use crate::config::{ble, gatt::CONTROL_VALUE_LEN, gatt::TELEMETRY_VALUE_LEN};
use crate::gatt::advertiser::{Advertiser, AdvertisingError};
use crate::gatt::commands::{CommandHandlers, Handler};
use crate::gatt::connections::{ConnectionError, ConnectionRegistry};
use crate::gatt::table::{AttributeHandles, Telemetry, GAUGE_SERVICE};
use crate::gatt::traits::{RadioError, RadioStack};
use crate::gatt::types::{ConnHandle, ControlCommand, RadioEvent};

/// Value written to the control characteristic once a write is handled
const CONTROL_ACK: [u8; 1] = [0x00];

/// Construction-time parameters
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Advertised device name
    pub device_name: &'static str,
    /// Advertising interval in microseconds
    pub adv_interval_us: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            device_name: ble::DEVICE_NAME,
            adv_interval_us: ble::ADV_INTERVAL_US,
        }
    }
}

/// Errors surfaced by the gauge service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// The attribute table could not be registered; start-up cannot continue
    Registration(RadioError),
    /// The advertising payload could not be built
    Advertising(AdvertisingError),
    /// Disconnect for a connection that is not registered
    UnknownConnection(ConnHandle),
    /// Connection registry has no room left
    RegistryFull(ConnHandle),
    /// Radio stack rejected an operation
    Radio(RadioError),
    /// Formatted value does not fit the characteristic
    ValueTooLong,
}

impl From<ConnectionError> for ServiceError {
    fn from(error: ConnectionError) -> Self {
        match error {
            ConnectionError::UnknownConnection(conn) => ServiceError::UnknownConnection(conn),
            ConnectionError::RegistryFull(conn) => ServiceError::RegistryFull(conn),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Registration(e) => write!(f, "registration failed: {}", e),
            ServiceError::Advertising(AdvertisingError::PayloadTooLong) => {
                f.write_str("advertising payload too long")
            }
            ServiceError::UnknownConnection(conn) => write!(f, "unknown connection {}", conn),
            ServiceError::RegistryFull(conn) => write!(f, "no room for connection {}", conn),
            ServiceError::Radio(e) => write!(f, "radio error: {}", e),
            ServiceError::ValueTooLong => f.write_str("formatted value too long"),
        }
    }
}

/// The boost gauge GATT service
pub struct GaugeService<'h, R: RadioStack> {
    radio: R,
    handles: AttributeHandles,
    connections: ConnectionRegistry,
    handlers: CommandHandlers<'h>,
    advertiser: Advertiser,
    pressure: f32,
    max_pressure: f32,
    sensor_voltage: f32,
}

impl<'h, R: RadioStack> GaugeService<'h, R> {
    /// Register the service, start advertising and seed the telemetry values.
    ///
    /// A registration error is fatal: the device has nothing else to do.
    pub fn new(mut radio: R, config: ServiceConfig) -> Result<Self, ServiceError> {
        let advertiser = Advertiser::new(config.device_name, config.adv_interval_us)
            .map_err(ServiceError::Advertising)?;

        let handles = radio
            .register_service(&GAUGE_SERVICE)
            .map_err(ServiceError::Registration)?;
        if !handles.is_distinct() {
            return Err(ServiceError::Registration(RadioError::RegistrationFailed));
        }
        info!("GATT: Service registered, handles {:?}", handles.to_ordered());

        let mut service = Self {
            radio,
            handles,
            connections: ConnectionRegistry::new(),
            handlers: CommandHandlers::new(),
            advertiser,
            pressure: 0.0,
            max_pressure: 0.0,
            sensor_voltage: 0.0,
        };

        service
            .advertiser
            .advertise(&mut service.radio)
            .map_err(ServiceError::Radio)?;

        service.set_pressure(0.0, false)?;
        service.set_sensor_voltage(0.0, false)?;
        service.set_max_pressure(0.0, false)?;

        Ok(service)
    }

    /// Process one radio event.
    ///
    /// A `Write` reads the value from the table, so it must be handled before
    /// the radio stores the next write. Errors are local to the event; the
    /// service stays usable.
    pub fn handle_event(&mut self, event: RadioEvent) -> Result<(), ServiceError> {
        match event {
            RadioEvent::Connect { conn } => {
                info!("GATT: Central {} connected", conn);
                self.connections.add(conn)?;
                Ok(())
            }
            RadioEvent::Disconnect { conn } => {
                info!("GATT: Central {} disconnected", conn);
                let removed = self.connections.remove(conn);
                let advertised = self.advertiser.advertise(&mut self.radio);
                removed?;
                advertised.map_err(ServiceError::Radio)
            }
            RadioEvent::Write { conn, attr } => {
                if attr == self.handles.sensor_control {
                    self.handle_control_write(conn)
                } else {
                    debug!("GATT: Ignoring write to {} from {}", attr, conn);
                    Ok(())
                }
            }
        }
    }

    /// Decode the control value, dispatch it, then acknowledge by clearing it
    fn handle_control_write(&mut self, conn: ConnHandle) -> Result<(), ServiceError> {
        let handle = self.handles.sensor_control;
        let mut buf = [0u8; CONTROL_VALUE_LEN];

        let command = match self.radio.read_attribute(handle, &mut buf) {
            Ok(len) => ControlCommand::from_payload(&buf[..len]),
            Err(e) => {
                warn!("GATT: Could not read control value from {}: {}", conn, e);
                None
            }
        };

        match command {
            Some(command) => {
                info!("GATT: {:?} from {}", command, conn);
                self.handlers.dispatch(command);
            }
            None => debug!("GATT: Ignoring control payload from {}", conn),
        }

        self.radio
            .write_attribute(handle, &CONTROL_ACK)
            .map_err(ServiceError::Radio)
    }

    /// Publish live pressure in psi
    pub fn set_pressure(&mut self, value: f32, notify: bool) -> Result<(), ServiceError> {
        self.publish(Telemetry::Pressure, value, notify)?;
        self.pressure = value;
        Ok(())
    }

    /// Publish peak pressure in psi
    pub fn set_max_pressure(&mut self, value: f32, notify: bool) -> Result<(), ServiceError> {
        self.publish(Telemetry::MaxPressure, value, notify)?;
        self.max_pressure = value;
        Ok(())
    }

    /// Publish sensor voltage in volts
    pub fn set_sensor_voltage(&mut self, value: f32, notify: bool) -> Result<(), ServiceError> {
        self.publish(Telemetry::SensorVoltage, value, notify)?;
        self.sensor_voltage = value;
        Ok(())
    }

    /// Write the formatted value, then notify every connection unless suppressed
    fn publish(&mut self, telemetry: Telemetry, value: f32, notify: bool) -> Result<(), ServiceError> {
        let mut text: String<TELEMETRY_VALUE_LEN> = String::new();
        write!(text, "{}{}", value, telemetry.suffix()).map_err(|_| ServiceError::ValueTooLong)?;

        let handle = self.handles.telemetry(telemetry);
        self.radio
            .write_attribute(handle, text.as_bytes())
            .map_err(ServiceError::Radio)?;

        if notify {
            for conn in self.connections.iter() {
                if let Err(e) = self.radio.notify(conn, handle) {
                    warn!("GATT: Failed to notify {} of {:?}: {}", conn, telemetry, e);
                }
            }
        }

        Ok(())
    }

    /// Latest live pressure
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Latest peak pressure
    pub fn max_pressure(&self) -> f32 {
        self.max_pressure
    }

    /// Latest sensor voltage
    pub fn sensor_voltage(&self) -> f32 {
        self.sensor_voltage
    }

    /// Register the handler for a control command
    pub fn set_handler(&mut self, command: ControlCommand, handler: Handler<'h>) {
        self.handlers.set(command, handler);
    }

    pub fn on_zero_sensor(&mut self, handler: Handler<'h>) {
        self.set_handler(ControlCommand::ZeroSensor, handler);
    }

    pub fn on_reset_zeroing(&mut self, handler: Handler<'h>) {
        self.set_handler(ControlCommand::ResetZeroing, handler);
    }

    pub fn on_reset_max_pressure(&mut self, handler: Handler<'h>) {
        self.set_handler(ControlCommand::ResetMaxPressure, handler);
    }

    /// Handles assigned at registration
    pub fn handles(&self) -> &AttributeHandles {
        &self.handles
    }

    /// Currently connected centrals
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// The underlying radio stack
    pub fn radio(&self) -> &R {
        &self.radio
    }
}
