//! Gauge task
//!
//! Owns the gauge service and the controller. Radio events and the sample
//! ticker are handled on this one task, so the service is never shared.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};
use embedded_storage::Storage;
use log::{error, info, warn};

use crate::ble::radio::{EspRadio, EVENT_CHANNEL, WRITE_HANDLED};
use crate::config::gauge::{SAMPLE_PERIOD_MS, STORAGE_PERIOD_MS, UPDATE_PERIOD_MS};
use crate::gatt::{ControlCommand, GaugeService, RadioEvent, ServiceConfig};
use crate::gauge::{GaugeController, PendingCommand};
use crate::sensor::VoltageSource;

pub async fn gauge_task<V: VoltageSource, S: Storage>(
    radio: EspRadio,
    mut controller: GaugeController<V, S>,
) {
    let pending = PendingCommand::new();
    let on_zero_sensor = || pending.set(ControlCommand::ZeroSensor);
    let on_reset_zeroing = || pending.set(ControlCommand::ResetZeroing);
    let on_reset_max_pressure = || pending.set(ControlCommand::ResetMaxPressure);

    let mut service = match GaugeService::new(radio, ServiceConfig::default()) {
        Ok(service) => service,
        Err(e) => {
            error!("GAUGE: Service start failed: {}", e);
            return;
        }
    };
    service.on_zero_sensor(&on_zero_sensor);
    service.on_reset_zeroing(&on_reset_zeroing);
    service.on_reset_max_pressure(&on_reset_max_pressure);

    match controller.restore(&mut service) {
        Ok(calibration) => info!(
            "GAUGE: Restored max {} psi, offset {} psi",
            calibration.max_pressure, calibration.zero_offset
        ),
        Err(e) => warn!("GAUGE: Restore failed: {}", e),
    }

    let events = EVENT_CHANNEL.receiver();
    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_PERIOD_MS));
    let update_period = Duration::from_millis(UPDATE_PERIOD_MS);
    let storage_period = Duration::from_millis(STORAGE_PERIOD_MS);
    let mut last_update = Instant::now();
    let mut last_persist = Instant::now();

    loop {
        match select(events.receive(), ticker.next()).await {
            Either::First(event) => {
                if let Err(e) = service.handle_event(event) {
                    warn!("GAUGE: {:?}: {}", event, e);
                }
                if let RadioEvent::Write { .. } = event {
                    WRITE_HANDLED.signal(());
                }
                if let Some(command) = pending.take() {
                    if let Err(e) = controller.apply(command, &mut service) {
                        warn!("GAUGE: {:?} failed: {}", command, e);
                    }
                }
            }
            Either::Second(()) => {
                let now = Instant::now();
                if now - last_update >= update_period {
                    last_update = now;
                    if let Err(e) = controller.update(&mut service) {
                        warn!("GAUGE: Update failed: {}", e);
                    }
                }
                if now - last_persist >= storage_period {
                    last_persist = now;
                    if let Err(e) = controller.persist(&service) {
                        warn!("GAUGE: Persist failed: {}", e);
                    }
                }

                // Sample errors are logged by the sensor
                let _ = controller.sample();
            }
        }
    }
}
