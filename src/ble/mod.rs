//! Bluetooth Low Energy module
//!
//! The trouble-host GATT server for the boost gauge and the radio adapter
//! that lets the gauge service drive it.

pub mod radio;
pub mod service;

pub use radio::{
    telemetry_characteristic, AdvertiseRequest, EspRadio, NotifyRequest, ADVERTISE_SIGNAL,
    EVENT_CHANNEL, NOTIFY_CHANNEL,
};
pub use service::{BoostService, GaugeServer};
