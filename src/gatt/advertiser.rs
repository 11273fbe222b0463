//! Advertising payload and re-advertise policy
//!
//! The payload carries Flags, Complete Local Name and Appearance. The service
//! UUID is not advertised; centrals find the service after connecting.

use crate::config::ble::{APPEARANCE, MAX_ADV_DATA_LEN};
use crate::gatt::traits::{RadioError, RadioStack};
use heapless::Vec;
use log::{info, warn};
use trouble_host::prelude::{AdStructure, BR_EDR_NOT_SUPPORTED, LE_GENERAL_DISCOVERABLE};

/// AD type: Appearance
const AD_APPEARANCE: u8 = 0x19;

/// Raw legacy advertising data
pub type AdvData = Vec<u8, MAX_ADV_DATA_LEN>;

/// Payload construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingError {
    /// Name plus fixed fields exceed the 31-byte legacy limit
    PayloadTooLong,
}

/// Build the advertising payload for `name` with the gauge's appearance
pub fn build_payload(name: &str, appearance: u16) -> Result<AdvData, AdvertisingError> {
    let appearance = appearance.to_le_bytes();
    let mut adv_data = [0u8; MAX_ADV_DATA_LEN];

    let encoded = if name.is_empty() {
        AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::Unknown { ty: AD_APPEARANCE, data: &appearance },
            ],
            &mut adv_data,
        )
    } else {
        AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::CompleteLocalName(name.as_bytes()),
                AdStructure::Unknown { ty: AD_APPEARANCE, data: &appearance },
            ],
            &mut adv_data,
        )
    };

    let len = encoded.map_err(|_| AdvertisingError::PayloadTooLong)?;
    AdvData::from_slice(&adv_data[..len]).map_err(|_| AdvertisingError::PayloadTooLong)
}

/// Precomputed payload issued at a fixed interval
pub struct Advertiser {
    payload: AdvData,
    interval_us: u32,
}

impl Advertiser {
    /// Create an advertiser for `name`
    pub fn new(name: &str, interval_us: u32) -> Result<Self, AdvertisingError> {
        Ok(Self {
            payload: build_payload(name, APPEARANCE)?,
            interval_us,
        })
    }

    /// Start (or restart) advertising
    pub fn advertise<R: RadioStack>(&self, radio: &mut R) -> Result<(), RadioError> {
        match radio.advertise(self.interval_us, &self.payload) {
            Ok(()) => {
                info!("ADVERTISER: Advertising every {} us", self.interval_us);
                Ok(())
            }
            Err(e) => {
                warn!("ADVERTISER: Failed to start advertising: {}", e);
                Err(e)
            }
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
