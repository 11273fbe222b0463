//! Boost gauge attribute table
//!
//! One primary service with four characteristics, each carrying a
//! Characteristic User Description (0x2901) with a fixed label:
//!
//! | Characteristic | UUID                                   | Properties   | Value          |
//! |----------------|----------------------------------------|--------------|----------------|
//! | Pressure       | e6ea4e76-f7ce-11ec-b939-0242ac120002   | read, notify | `"<v> psi"`    |
//! | Max Pressure   | 2826c950-f7ca-11ec-b939-0242ac120002   | read, notify | `"<v> psi"`    |
//! | Sensor Voltage | 0x2B18                                 | read, notify | `"<v>V"`       |
//! | Sensor Control | da0f8b10-f7cb-11ec-b939-0242ac120002   | write        | opcode byte    |

use trouble_host::prelude::{CharacteristicProp, Uuid};

use crate::gatt::types::AttrHandle;

/// Boost gauge primary service
pub const SERVICE_UUID: Uuid =
    Uuid::new_long(0xfab0ed78_f7c6_11ec_b939_0242ac120002u128.to_le_bytes());
/// Live pressure characteristic
pub const PRESSURE_UUID: Uuid =
    Uuid::new_long(0xe6ea4e76_f7ce_11ec_b939_0242ac120002u128.to_le_bytes());
/// Peak pressure characteristic
pub const MAX_PRESSURE_UUID: Uuid =
    Uuid::new_long(0x2826c950_f7ca_11ec_b939_0242ac120002u128.to_le_bytes());
/// Sensor voltage characteristic (SIG "Voltage")
pub const SENSOR_VOLTAGE_UUID: Uuid = Uuid::new_short(0x2B18);
/// Control point characteristic
pub const SENSOR_CONTROL_UUID: Uuid =
    Uuid::new_long(0xda0f8b10_f7cb_11ec_b939_0242ac120002u128.to_le_bytes());
/// Characteristic User Description descriptor
pub const USER_DESCRIPTION_UUID: Uuid = Uuid::new_short(0x2901);

pub const PRESSURE_LABEL: &str = "Pressure";
pub const MAX_PRESSURE_LABEL: &str = "Max pressure";
pub const SENSOR_VOLTAGE_LABEL: &str = "Sensor voltage";
pub const SENSOR_CONTROL_LABEL: &str = "General purpose sensor control";

const READ_NOTIFY: &[CharacteristicProp] = &[CharacteristicProp::Read, CharacteristicProp::Notify];
const WRITE: &[CharacteristicProp] = &[CharacteristicProp::Write];

/// Static declaration of one characteristic
#[derive(Debug, Clone)]
pub struct CharacteristicDefinition {
    pub uuid: Uuid,
    pub properties: &'static [CharacteristicProp],
    /// Read-only user description label
    pub description: &'static str,
}

impl CharacteristicDefinition {
    /// Whether the characteristic declares `prop`
    pub fn has(&self, prop: CharacteristicProp) -> bool {
        self.properties.iter().any(|p| *p as u8 == prop as u8)
    }
}

// `CharacteristicProp` does not implement `PartialEq`; compare by discriminant.
impl PartialEq for CharacteristicDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .zip(other.properties)
                .all(|(a, b)| *a as u8 == *b as u8)
            && self.description == other.description
    }
}

/// Static declaration of the service handed to the radio at registration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub uuid: Uuid,
    /// Declaration order; determines handle order
    pub characteristics: [CharacteristicDefinition; 4],
}

/// The boost gauge service
pub const GAUGE_SERVICE: ServiceDefinition = ServiceDefinition {
    uuid: SERVICE_UUID,
    characteristics: [
        CharacteristicDefinition {
            uuid: PRESSURE_UUID,
            properties: READ_NOTIFY,
            description: PRESSURE_LABEL,
        },
        CharacteristicDefinition {
            uuid: MAX_PRESSURE_UUID,
            properties: READ_NOTIFY,
            description: MAX_PRESSURE_LABEL,
        },
        CharacteristicDefinition {
            uuid: SENSOR_VOLTAGE_UUID,
            properties: READ_NOTIFY,
            description: SENSOR_VOLTAGE_LABEL,
        },
        CharacteristicDefinition {
            uuid: SENSOR_CONTROL_UUID,
            properties: WRITE,
            description: SENSOR_CONTROL_LABEL,
        },
    ],
};

/// Handles returned by service registration.
///
/// Registration yields eight handles, characteristic value handle followed by
/// its description handle, in declaration order:
/// `[pressure, pressure_desc, max_pressure, max_pressure_desc,
///   sensor_voltage, sensor_voltage_desc, sensor_control, sensor_control_desc]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHandles {
    pub pressure: AttrHandle,
    pub pressure_desc: AttrHandle,
    pub max_pressure: AttrHandle,
    pub max_pressure_desc: AttrHandle,
    pub sensor_voltage: AttrHandle,
    pub sensor_voltage_desc: AttrHandle,
    pub sensor_control: AttrHandle,
    pub sensor_control_desc: AttrHandle,
}

impl AttributeHandles {
    /// Build from handles in registration order
    pub const fn from_ordered(handles: [AttrHandle; 8]) -> Self {
        Self {
            pressure: handles[0],
            pressure_desc: handles[1],
            max_pressure: handles[2],
            max_pressure_desc: handles[3],
            sensor_voltage: handles[4],
            sensor_voltage_desc: handles[5],
            sensor_control: handles[6],
            sensor_control_desc: handles[7],
        }
    }

    /// Handles in registration order
    pub const fn to_ordered(&self) -> [AttrHandle; 8] {
        [
            self.pressure,
            self.pressure_desc,
            self.max_pressure,
            self.max_pressure_desc,
            self.sensor_voltage,
            self.sensor_voltage_desc,
            self.sensor_control,
            self.sensor_control_desc,
        ]
    }

    /// Value handle of a telemetry characteristic
    pub fn telemetry(&self, telemetry: Telemetry) -> AttrHandle {
        match telemetry {
            Telemetry::Pressure => self.pressure,
            Telemetry::MaxPressure => self.max_pressure,
            Telemetry::SensorVoltage => self.sensor_voltage,
        }
    }

    /// Whether every handle is distinct
    pub fn is_distinct(&self) -> bool {
        let handles = self.to_ordered();
        handles
            .iter()
            .enumerate()
            .all(|(i, h)| !handles[i + 1..].contains(h))
    }
}

/// The three read/notify telemetry characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Telemetry {
    Pressure,
    MaxPressure,
    SensorVoltage,
}

impl Telemetry {
    /// Unit suffix appended to the formatted value
    pub fn suffix(self) -> &'static str {
        match self {
            Telemetry::Pressure | Telemetry::MaxPressure => " psi",
            Telemetry::SensorVoltage => "V",
        }
    }
}
