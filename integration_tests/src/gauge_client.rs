//! BLE client for the boost gauge service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Boost gauge service and characteristic UUIDs
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xfab0ed78_f7c6_11ec_b939_0242ac120002);
pub const PRESSURE_UUID: Uuid = Uuid::from_u128(0xe6ea4e76_f7ce_11ec_b939_0242ac120002);
pub const MAX_PRESSURE_UUID: Uuid = Uuid::from_u128(0x2826c950_f7ca_11ec_b939_0242ac120002);
pub const SENSOR_VOLTAGE_UUID: Uuid = Uuid::from_u128(0x00002b18_0000_1000_8000_00805f9b34fb);
pub const SENSOR_CONTROL_UUID: Uuid = Uuid::from_u128(0xda0f8b10_f7cb_11ec_b939_0242ac120002);

/// Characteristic User Description descriptor
pub const USER_DESCRIPTION_UUID: Uuid = Uuid::from_u128(0x00002901_0000_1000_8000_00805f9b34fb);

/// Control opcodes
pub const ZERO_SENSOR: u8 = 0x01;
pub const RESET_ZEROING: u8 = 0x02;
pub const RESET_MAX_PRESSURE: u8 = 0x03;

/// A notification as received, tagged with its characteristic
#[derive(Debug, Clone)]
pub struct Notification {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

/// BLE client for the boost gauge.
pub struct GaugeClient {
    peripheral: Peripheral,
    pressure: Characteristic,
    max_pressure: Characteristic,
    sensor_voltage: Characteristic,
    sensor_control: Characteristic,
    /// Notifications received since the last clear
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl GaugeClient {
    /// Scan for a device by name and connect.
    pub async fn connect_by_name(name: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter.start_scan(ScanFilter::default()).await?;
        let peripheral = Self::find_device_by_name(&adapter, name, scan_timeout).await?;
        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let find = |uuid: Uuid, label: &str| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid && c.service_uuid == SERVICE_UUID)
                .cloned()
                .ok_or_else(|| anyhow!("{} characteristic not found", label))
        };

        let pressure = find(PRESSURE_UUID, "Pressure")?;
        let max_pressure = find(MAX_PRESSURE_UUID, "Max pressure")?;
        let sensor_voltage = find(SENSOR_VOLTAGE_UUID, "Sensor voltage")?;
        let sensor_control = find(SENSOR_CONTROL_UUID, "Sensor control")?;

        for characteristic in [&pressure, &max_pressure, &sensor_voltage] {
            peripheral.subscribe(characteristic).await?;
        }

        let notifications = Arc::new(Mutex::new(Vec::new()));

        let buffer = notifications.clone();
        let peripheral_clone = peripheral.clone();
        tokio::spawn(async move {
            let mut stream = match peripheral_clone.notifications().await {
                Ok(s) => s,
                Err(_) => return,
            };

            while let Some(data) = stream.next().await {
                buffer.lock().await.push(Notification {
                    uuid: data.uuid,
                    value: data.value,
                });
            }
        });

        Ok(Self {
            peripheral,
            pressure,
            max_pressure,
            sensor_voltage,
            sensor_control,
            notifications,
        })
    }

    /// Find a device by name within the scan timeout.
    async fn find_device_by_name(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            let peripherals = adapter.peripherals().await?;

            for peripheral in peripherals {
                if let Some(props) = peripheral.properties().await? {
                    if props.local_name.as_deref() == Some(name) {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("Device '{}' not found within timeout", name))
    }

    /// Read a characteristic as UTF-8 text.
    async fn read_text(&self, characteristic: &Characteristic) -> Result<String> {
        let value = self.peripheral.read(characteristic).await?;
        String::from_utf8(value).context("value is not UTF-8")
    }

    pub async fn read_pressure(&self) -> Result<String> {
        self.read_text(&self.pressure).await
    }

    pub async fn read_max_pressure(&self) -> Result<String> {
        self.read_text(&self.max_pressure).await
    }

    pub async fn read_sensor_voltage(&self) -> Result<String> {
        self.read_text(&self.sensor_voltage).await
    }

    /// User description labels, keyed by characteristic UUID.
    pub async fn read_descriptions(&self) -> Result<Vec<(Uuid, String)>> {
        let mut labels = Vec::new();
        for characteristic in [
            &self.pressure,
            &self.max_pressure,
            &self.sensor_voltage,
            &self.sensor_control,
        ] {
            let descriptor = characteristic
                .descriptors
                .iter()
                .find(|d| d.uuid == USER_DESCRIPTION_UUID)
                .ok_or_else(|| anyhow!("No user description on {}", characteristic.uuid))?;
            let value = self.peripheral.read_descriptor(descriptor).await?;
            labels.push((characteristic.uuid, String::from_utf8(value)?));
        }
        Ok(labels)
    }

    /// Write raw bytes to the control characteristic.
    pub async fn write_control(&self, payload: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.sensor_control, payload, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    /// Take every notification received so far.
    pub async fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().await)
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        for characteristic in [&self.pressure, &self.max_pressure, &self.sensor_voltage] {
            self.peripheral.unsubscribe(characteristic).await?;
        }
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// Parse a telemetry value such as `23.4 psi` or `2.25V`.
pub fn parse_value(text: &str, suffix: &str) -> Result<f32> {
    let number = text
        .strip_suffix(suffix)
        .ok_or_else(|| anyhow!("'{}' does not end with '{}'", text, suffix))?;
    number
        .parse::<f32>()
        .with_context(|| format!("'{}' is not a number", number))
}
