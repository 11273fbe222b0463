//! Hardware and protocol configuration constants for the ESP32-S3 boost gauge

/// BLE peripheral configuration
pub mod ble {
    /// Advertised complete local name
    pub const DEVICE_NAME: &str = "Rupert's MR2";

    /// GAP appearance: Car (vehicle category, 0x08C1)
    pub const APPEARANCE: u16 = 0x08C1;

    /// Default advertising interval in microseconds (500 ms)
    pub const ADV_INTERVAL_US: u32 = 500_000;

    /// Legacy advertising data limit
    pub const MAX_ADV_DATA_LEN: usize = 31;

    /// Capacity of the connection registry; must be at least `CONNECTIONS_MAX`
    pub const REGISTRY_CAPACITY: usize = 16;

    /// Number of maximum concurrent connections accepted by the host stack
    pub const CONNECTIONS_MAX: usize = 1;

    /// Number of L2CAP channels
    pub const L2CAP_CHANNELS_MAX: usize = 3;

    /// Depth of the radio event and notification queues
    pub const EVENT_QUEUE_DEPTH: usize = 8;
}

/// GATT value sizing
pub mod gatt {
    /// Capacity of a formatted telemetry value; holds any `f32` rendering plus its unit
    pub const TELEMETRY_VALUE_LEN: usize = 64;

    /// Capacity of the control characteristic; anything longer than one byte is ignored anyway
    pub const CONTROL_VALUE_LEN: usize = 8;
}

/// Boost sensor configuration
pub mod sensor {
    /// Sensor supply voltage in volts
    pub const VCC: f32 = 5.0;

    /// Ratio of the resistor divider between the sensor output and the ADC pin
    pub const DIVIDER_RATIO: f32 = 2.0;

    /// Standard atmospheric pressure in kPa
    pub const ATMOSPHERIC_KPA: f32 = 101.325;

    /// kPa per psi
    pub const KPA_PER_PSI: f32 = 6.895;
}

/// Gauge loop timing
pub mod gauge {
    /// Interval between ADC samples
    pub const SAMPLE_PERIOD_MS: u64 = 5;

    /// Interval between published readings
    pub const UPDATE_PERIOD_MS: u64 = 200;

    /// Interval between calibration writes to flash
    pub const STORAGE_PERIOD_MS: u64 = 10_000;
}

/// Calibration storage
pub mod storage {
    /// Flash offset of the calibration record (start of the default NVS partition)
    pub const CALIBRATION_OFFSET: u32 = 0x9000;

    /// Record marker ("BGC1")
    pub const MAGIC: u32 = 0x3143_4742;

    /// Fixed-point scale: values are stored with three decimal places
    pub const SCALE: f32 = 1000.0;
}
