//! Core types for the boost gauge GATT protocol
//!
//! # Control Protocol
//!
//! A central controls the gauge by writing a single opcode byte to the
//! Sensor Control characteristic:
//!
//! | Byte | Command          |
//! |------|------------------|
//! | 0x01 | ZeroSensor       |
//! | 0x02 | ResetZeroing     |
//! | 0x03 | ResetMaxPressure |
//!
//! Any other payload (unknown byte, empty, more than one byte) is ignored.
//! After every write the characteristic is reset to `[0x00]`.

/// Opaque connection handle assigned by the radio stack
pub type ConnHandle = u16;

/// Opaque attribute handle assigned by the radio stack at registration
pub type AttrHandle = u16;

/// Events raised by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    /// A central connected
    Connect { conn: ConnHandle },
    /// A central disconnected
    Disconnect { conn: ConnHandle },
    /// A central wrote to an attribute; the value is already in the table
    Write { conn: ConnHandle, attr: AttrHandle },
}

/// Control command opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Zero the sensor at the current pressure (0x01)
    ZeroSensor = 0x01,

    /// Clear the zero offset (0x02)
    ResetZeroing = 0x02,

    /// Reset the recorded peak pressure to zero (0x03)
    ResetMaxPressure = 0x03,
}

impl ControlCommand {
    /// All commands, in opcode order
    pub const ALL: [ControlCommand; 3] = [
        ControlCommand::ZeroSensor,
        ControlCommand::ResetZeroing,
        ControlCommand::ResetMaxPressure,
    ];

    /// Try to convert an opcode byte to a command
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::ZeroSensor),
            0x02 => Some(Self::ResetZeroing),
            0x03 => Some(Self::ResetMaxPressure),
            _ => None,
        }
    }

    /// Decode a raw control payload.
    ///
    /// Only single-byte payloads carry a command.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [byte] => Self::from_byte(*byte),
            _ => None,
        }
    }

    /// Slot index into per-command tables
    pub(crate) fn index(self) -> usize {
        (self as u8 - 1) as usize
    }
}
