//! Boost gauge GATT service definition
//!
//! UUIDs and user description labels come from [`crate::gatt::table`], the
//! same declaration the gauge service registers against.

use heapless::Vec;
use trouble_host::prelude::*;

use crate::config::gatt::{CONTROL_VALUE_LEN, TELEMETRY_VALUE_LEN};
use crate::gatt::table::{
    MAX_PRESSURE_LABEL, MAX_PRESSURE_UUID, PRESSURE_LABEL, PRESSURE_UUID, SENSOR_CONTROL_LABEL,
    SENSOR_CONTROL_UUID, SENSOR_VOLTAGE_LABEL, SENSOR_VOLTAGE_UUID, SERVICE_UUID,
    USER_DESCRIPTION_UUID,
};

/// Formatted telemetry text, e.g. `23.4 psi`
pub type TelemetryValue = Vec<u8, TELEMETRY_VALUE_LEN>;

/// Raw control opcode
pub type ControlValue = Vec<u8, CONTROL_VALUE_LEN>;

#[gatt_service(uuid = SERVICE_UUID)]
pub struct BoostService {
    #[descriptor(uuid = USER_DESCRIPTION_UUID, read, value = PRESSURE_LABEL)]
    #[characteristic(uuid = PRESSURE_UUID, read, notify)]
    pub pressure: TelemetryValue,

    #[descriptor(uuid = USER_DESCRIPTION_UUID, read, value = MAX_PRESSURE_LABEL)]
    #[characteristic(uuid = MAX_PRESSURE_UUID, read, notify)]
    pub max_pressure: TelemetryValue,

    #[descriptor(uuid = USER_DESCRIPTION_UUID, read, value = SENSOR_VOLTAGE_LABEL)]
    #[characteristic(uuid = SENSOR_VOLTAGE_UUID, read, notify)]
    pub sensor_voltage: TelemetryValue,

    #[descriptor(uuid = USER_DESCRIPTION_UUID, read, value = SENSOR_CONTROL_LABEL)]
    #[characteristic(uuid = SENSOR_CONTROL_UUID, write)]
    pub sensor_control: ControlValue,
}

/// GATT server holding the gauge service
#[gatt_server(mutex_type = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex)]
pub struct GaugeServer {
    pub gauge: BoostService,
}
