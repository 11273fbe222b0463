#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_storage::FlashStorage;
use log::info;
use static_cell::StaticCell;
use trouble_host::prelude::*;

use boost_gauge_firmware::ble::{EspRadio, GaugeServer};
use boost_gauge_firmware::config::ble::{APPEARANCE, DEVICE_NAME};
use boost_gauge_firmware::gauge::GaugeController;
use boost_gauge_firmware::sensor::{AdcVoltage, BoostSensor};
use boost_gauge_firmware::storage::CalibrationStore;
use boost_gauge_firmware::tasks;

/// GAP appearance characteristic value
const GAP_APPEARANCE: BluetoothUuid16 = BluetoothUuid16::new(APPEARANCE);

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// GATT server shared by the BLE task and the gauge task
static SERVER: StaticCell<GaugeServer<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = ExternalController<esp_radio::ble::controller::BleConnector<'static>, 10>;

/// Type alias for the gauge controller on this board
type Gauge = GaugeController<AdcVoltage<'static>, FlashStorage<'static>>;

#[esp_hal::main]
fn main() -> ! {
    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("{} v{}", DEVICE_NAME, env!("CARGO_PKG_VERSION"));

    // Boost sensor on ADC1 and calibration in flash
    let sensor = BoostSensor::new(AdcVoltage::new(peripherals.ADC1, peripherals.GPIO4));
    let store = CalibrationStore::new(FlashStorage::new(peripherals.FLASH));
    let gauge = GaugeController::new(sensor, store);

    // Random static address from the eFuse MAC address (last 3 bytes)
    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let address = [mac[3], mac[4], mac[5], 0x1E, 0x83, 0xE7];

    // Initialise esp-radio for BLE support (must be after esp_rtos::start)
    let radio_controller = RADIO_CONTROLLER.init(
        esp_radio::init().expect("Failed to initialize esp-radio")
    );

    // Create BLE connector (ownership is passed to ExternalController)
    let ble_connector = esp_radio::ble::controller::BleConnector::new(
        radio_controller,
        peripherals.BT,
        esp_radio::ble::Config::default(),
    ).expect("Failed to initialize BLE connector");

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = ExternalController::new(ble_connector);

    // Create GATT server with GAP configuration
    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &GAP_APPEARANCE,
    });
    let server = SERVER.init(
        GaugeServer::new_with_config(gap).expect("Failed to build GATT server")
    );

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, controller, server, address, gauge));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    ble_controller: BleController,
    server: &'static GaugeServer<'static>,
    address: [u8; 6],
    gauge: Gauge,
) {
    spawner.must_spawn(ble_host_task(ble_controller, server, address));
    spawner.must_spawn(gauge_task(EspRadio::new(server), gauge));
}

/// Task that manages BLE connectivity
#[embassy_executor::task]
async fn ble_host_task(
    controller: BleController,
    server: &'static GaugeServer<'static>,
    address: [u8; 6],
) {
    tasks::ble_task(controller, server, address).await;
}

/// Task that samples the sensor and drives the gauge service
#[embassy_executor::task]
async fn gauge_task(radio: EspRadio, gauge: Gauge) {
    tasks::gauge_task(radio, gauge).await;
}
