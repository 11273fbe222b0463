//! `RadioStack` over the trouble-host attribute server
//!
//! Attribute reads and writes go straight to the server's table. Work that
//! needs the connection (notifications, advertising) is queued here and
//! carried out by the BLE task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;
use log::debug;
use trouble_host::prelude::*;

use crate::ble::service::{ControlValue, GaugeServer, TelemetryValue};
use crate::config::ble::{EVENT_QUEUE_DEPTH, MAX_ADV_DATA_LEN};
use crate::gatt::table::{AttributeHandles, ServiceDefinition};
use crate::gatt::traits::{RadioError, RadioStack};
use crate::gatt::types::{AttrHandle, ConnHandle, RadioEvent};

/// Notification waiting to be sent on a connection
#[derive(Debug, Clone, Copy)]
pub struct NotifyRequest {
    pub conn: ConnHandle,
    pub handle: AttrHandle,
}

/// Latest advertising parameters
#[derive(Debug, Clone)]
pub struct AdvertiseRequest {
    pub interval_us: u32,
    pub data: Vec<u8, MAX_ADV_DATA_LEN>,
}

/// Radio events from the BLE task to the gauge task
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, RadioEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Notifications from the gauge task to the BLE task
pub static NOTIFY_CHANNEL: Channel<CriticalSectionRawMutex, NotifyRequest, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Advertising requests; only the latest one matters
pub static ADVERTISE_SIGNAL: Signal<CriticalSectionRawMutex, AdvertiseRequest> = Signal::new();

/// Raised by the gauge task once a `RadioEvent::Write` has been handled.
///
/// The BLE task accepts no further GATT event until then, so each written
/// value is read and acknowledged before the next one lands in the table.
pub static WRITE_HANDLED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Find the telemetry characteristic whose value lives at `handle`
pub fn telemetry_characteristic<'a>(
    server: &'a GaugeServer<'_>,
    handle: AttrHandle,
) -> Option<&'a Characteristic<TelemetryValue>> {
    let gauge = &server.gauge;
    [&gauge.pressure, &gauge.max_pressure, &gauge.sensor_voltage]
        .into_iter()
        .find(|characteristic| characteristic.handle == handle)
}

/// The user description follows the value, after the CCCD if there is one
fn description_handle<T: AsGatt + ?Sized>(characteristic: &Characteristic<T>) -> AttrHandle {
    characteristic.handle + if characteristic.cccd_handle.is_some() { 2 } else { 1 }
}

/// Radio stack backed by the static GATT server
pub struct EspRadio {
    server: &'static GaugeServer<'static>,
}

impl EspRadio {
    pub fn new(server: &'static GaugeServer<'static>) -> Self {
        Self { server }
    }
}

impl RadioStack for EspRadio {
    fn register_service(
        &mut self,
        service: &ServiceDefinition,
    ) -> Result<AttributeHandles, RadioError> {
        let gauge = &self.server.gauge;
        // The server macro builds the table from the same UUIDs and labels;
        // only the CCCD layout depends on the macro's property flags
        let cccds = [
            gauge.pressure.cccd_handle.is_some(),
            gauge.max_pressure.cccd_handle.is_some(),
            gauge.sensor_voltage.cccd_handle.is_some(),
            gauge.sensor_control.cccd_handle.is_some(),
        ];
        for (definition, has_cccd) in service.characteristics.iter().zip(cccds) {
            if definition.has(CharacteristicProp::Notify) != has_cccd {
                return Err(RadioError::RegistrationFailed);
            }
        }

        Ok(AttributeHandles::from_ordered([
            gauge.pressure.handle,
            description_handle(&gauge.pressure),
            gauge.max_pressure.handle,
            description_handle(&gauge.max_pressure),
            gauge.sensor_voltage.handle,
            description_handle(&gauge.sensor_voltage),
            gauge.sensor_control.handle,
            description_handle(&gauge.sensor_control),
        ]))
    }

    fn write_attribute(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), RadioError> {
        let control = &self.server.gauge.sensor_control;
        if handle == control.handle {
            let value = ControlValue::from_slice(value).map_err(|_| RadioError::ValueTooLong)?;
            return self
                .server
                .set(control, &value)
                .map_err(|_| RadioError::InvalidHandle);
        }

        let characteristic =
            telemetry_characteristic(self.server, handle).ok_or(RadioError::InvalidHandle)?;
        let value = TelemetryValue::from_slice(value).map_err(|_| RadioError::ValueTooLong)?;
        self.server
            .set(characteristic, &value)
            .map_err(|_| RadioError::InvalidHandle)
    }

    fn read_attribute(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, RadioError> {
        let control = &self.server.gauge.sensor_control;
        let value: TelemetryValue = if handle == control.handle {
            let value = self.server.get(control).map_err(|_| RadioError::InvalidHandle)?;
            Vec::from_slice(&value).map_err(|_| RadioError::ValueTooLong)?
        } else {
            let characteristic =
                telemetry_characteristic(self.server, handle).ok_or(RadioError::InvalidHandle)?;
            self.server
                .get(characteristic)
                .map_err(|_| RadioError::InvalidHandle)?
        };

        let dest = buf.get_mut(..value.len()).ok_or(RadioError::ValueTooLong)?;
        dest.copy_from_slice(&value);
        Ok(value.len())
    }

    fn notify(&mut self, conn: ConnHandle, handle: AttrHandle) -> Result<(), RadioError> {
        if telemetry_characteristic(self.server, handle).is_none() {
            return Err(RadioError::InvalidHandle);
        }
        NOTIFY_CHANNEL
            .try_send(NotifyRequest { conn, handle })
            .map_err(|_| RadioError::NotifyFailed)
    }

    fn advertise(&mut self, interval_us: u32, adv_data: &[u8]) -> Result<(), RadioError> {
        let data = Vec::from_slice(adv_data).map_err(|_| RadioError::AdvertiseFailed)?;
        debug!("RADIO: Advertise request queued");
        ADVERTISE_SIGNAL.signal(AdvertiseRequest { interval_us, data });
        Ok(())
    }
}
