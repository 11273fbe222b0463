//! BLE host task
//!
//! Runs the trouble-host stack: advertises when asked, accepts one central
//! at a time, forwards its events to the gauge task and sends the queued
//! notifications.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use log::{debug, info, warn};
use trouble_host::prelude::*;

use crate::ble::radio::{
    telemetry_characteristic, ADVERTISE_SIGNAL, EVENT_CHANNEL, NOTIFY_CHANNEL, WRITE_HANDLED,
};
use crate::ble::service::GaugeServer;
use crate::config::ble::{CONNECTIONS_MAX, L2CAP_CHANNELS_MAX};
use crate::gatt::types::{AttrHandle, RadioEvent};

/// Delay before retrying a failed advertise
const ADVERTISE_RETRY_MS: u64 = 1_000;

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Waits for the gauge service to request advertising
/// 2. Accepts a connection and attaches the GATT server
/// 3. Forwards connect, write and disconnect events to EVENT_CHANNEL
/// 4. Drains NOTIFY_CHANNEL into notifications on the live connection
pub async fn ble_task<C: Controller>(
    controller: C,
    server: &'static GaugeServer<'static>,
    address: [u8; 6],
) {
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random(address));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let runner_task = runner.run();

    let peripheral_task = async {
        let events = EVENT_CHANNEL.sender();
        let notifications = NOTIFY_CHANNEL.receiver();

        loop {
            let request = ADVERTISE_SIGNAL.wait().await;
            let interval = Duration::from_micros(request.interval_us as u64);
            let params = AdvertisementParameters {
                interval_min: interval,
                interval_max: interval,
                ..Default::default()
            };

            let advertiser = match peripheral
                .advertise(
                    &params,
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &request.data,
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(a) => a,
                Err(_) => {
                    warn!("BLE: Advertise failed, retrying");
                    Timer::after(Duration::from_millis(ADVERTISE_RETRY_MS)).await;
                    ADVERTISE_SIGNAL.signal(request);
                    continue;
                }
            };
            debug!("BLE: Advertising...");

            let acceptor = match advertiser.accept().await {
                Ok(a) => a,
                Err(_) => {
                    ADVERTISE_SIGNAL.signal(request);
                    continue;
                }
            };

            let conn = match acceptor.with_attribute_server(server) {
                Ok(c) => c,
                Err(_) => {
                    ADVERTISE_SIGNAL.signal(request);
                    continue;
                }
            };

            let handle = conn.raw().handle().raw();
            info!("BLE: Connected ({})", handle);
            events.send(RadioEvent::Connect { conn: handle }).await;

            // Notifications queued for an earlier connection are stale
            while notifications.try_receive().is_ok() {}

            loop {
                match select(conn.next(), notifications.receive()).await {
                    Either::First(GattConnectionEvent::Disconnected { reason: _ }) => {
                        info!("BLE: Disconnected ({})", handle);
                        events.send(RadioEvent::Disconnect { conn: handle }).await;
                        break;
                    }
                    Either::First(GattConnectionEvent::Gatt { event }) => match event {
                        GattEvent::Write(write_event) => {
                            let attr = write_event.handle();
                            // Accepting stores the value before the gauge task reads it
                            WRITE_HANDLED.reset();
                            let _ = write_event.accept();
                            events.send(RadioEvent::Write { conn: handle, attr }).await;
                            // Hold the next GATT event until this value is consumed
                            WRITE_HANDLED.wait().await;
                        }
                        GattEvent::Read(read_event) => {
                            let _ = read_event.accept();
                        }
                        GattEvent::Other(other_event) => {
                            let _ = other_event.accept();
                        }
                    },
                    Either::First(_) => {}
                    Either::Second(request) => {
                        if request.conn != handle {
                            debug!("BLE: Dropping notification for {}", request.conn);
                            continue;
                        }
                        if !notify(server, &conn, request.handle).await {
                            warn!("BLE: Notification of {} failed", request.handle);
                        }
                    }
                }
            }
        }
    };

    select(runner_task, peripheral_task).await;
}

/// Send the current value of a telemetry characteristic
async fn notify<P: PacketPool>(
    server: &GaugeServer<'_>,
    conn: &GattConnection<'_, '_, P>,
    handle: AttrHandle,
) -> bool {
    let Some(characteristic) = telemetry_characteristic(server, handle) else {
        return false;
    };
    match server.get(characteristic) {
        Ok(value) => characteristic.notify(conn, &value).await.is_ok(),
        Err(_) => false,
    }
}
