//! Calibration record persistence
//!
//! Record format: [magic: u32 LE][max_pressure: i32 LE][zero_offset: i32 LE][crc16: u16 LE]
//!
//! Values are stored in thousandths. The CRC covers everything before it.

use crate::config::storage::{CALIBRATION_OFFSET, MAGIC, SCALE};
use core::fmt;
use crc::{Crc, CRC_16_XMODEM};
use embedded_storage::Storage;
use log::{debug, info, warn};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Encoded record size: 4 (magic) + 4 (max) + 4 (offset) + 2 (crc)
pub const RECORD_LEN: usize = 14;

/// Errors from the underlying flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    ReadFailed,
    WriteFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed => f.write_str("flash read failed"),
            StorageError::WriteFailed => f.write_str("flash write failed"),
        }
    }
}

/// Fixed-point thousandths, rounded half away from zero
pub fn to_milli(value: f32) -> i32 {
    let scaled = value * SCALE;
    if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    }
}

pub fn from_milli(value: i32) -> f32 {
    value as f32 / SCALE
}

/// Persisted gauge calibration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    /// Peak pressure in psi
    pub max_pressure: f32,
    /// Zero offset in psi
    pub zero_offset: f32,
}

impl Calibration {
    /// Encode to the on-flash record
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        record[4..8].copy_from_slice(&to_milli(self.max_pressure).to_le_bytes());
        record[8..12].copy_from_slice(&to_milli(self.zero_offset).to_le_bytes());
        let crc = CRC.checksum(&record[..12]);
        record[12..14].copy_from_slice(&crc.to_le_bytes());
        record
    }

    /// Decode an on-flash record
    ///
    /// Returns `None` for erased flash, a foreign record or a CRC mismatch.
    pub fn decode(record: &[u8; RECORD_LEN]) -> Option<Self> {
        let magic = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        if magic != MAGIC {
            return None;
        }

        let received_crc = u16::from_le_bytes([record[12], record[13]]);
        if CRC.checksum(&record[..12]) != received_crc {
            return None;
        }

        let max = i32::from_le_bytes([record[4], record[5], record[6], record[7]]);
        let offset = i32::from_le_bytes([record[8], record[9], record[10], record[11]]);
        Some(Self {
            max_pressure: from_milli(max),
            zero_offset: from_milli(offset),
        })
    }
}

/// Calibration record at a fixed flash offset
pub struct CalibrationStore<S: Storage> {
    storage: S,
    offset: u32,
    /// Last record known to be on flash
    last: Option<[u8; RECORD_LEN]>,
}

impl<S: Storage> CalibrationStore<S> {
    /// Store at the default calibration offset
    pub fn new(storage: S) -> Self {
        Self::with_offset(storage, CALIBRATION_OFFSET)
    }

    pub fn with_offset(storage: S, offset: u32) -> Self {
        Self {
            storage,
            offset,
            last: None,
        }
    }

    /// Load the stored calibration.
    ///
    /// A missing or corrupt record is replaced with defaults, which are
    /// written back and returned.
    pub fn load(&mut self) -> Result<Calibration, StorageError> {
        let mut record = [0u8; RECORD_LEN];
        self.storage
            .read(self.offset, &mut record)
            .map_err(|_| StorageError::ReadFailed)?;

        match Calibration::decode(&record) {
            Some(calibration) => {
                info!(
                    "STORAGE: Loaded max {} psi, offset {} psi",
                    calibration.max_pressure, calibration.zero_offset
                );
                self.last = Some(record);
                Ok(calibration)
            }
            None => {
                warn!("STORAGE: No valid calibration at {:#x}, writing defaults", self.offset);
                let calibration = Calibration::default();
                self.save(&calibration)?;
                Ok(calibration)
            }
        }
    }

    /// Write every field at once; skipped if the record is unchanged
    pub fn save(&mut self, calibration: &Calibration) -> Result<(), StorageError> {
        let record = calibration.encode();
        if self.last == Some(record) {
            debug!("STORAGE: Calibration unchanged");
            return Ok(());
        }

        self.storage
            .write(self.offset, &record)
            .map_err(|_| StorageError::WriteFailed)?;
        self.last = Some(record);
        debug!("STORAGE: Calibration saved");
        Ok(())
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
