//! # Protocol Constants and Types
//!
//! Core protocol definitions for the MCU link framing protocol.
//!
//! Frame layout (big-endian throughout):
//! ```text
//! [START 0xAA][CMD][LEN_HI][LEN_LO][PAYLOAD ...][CRC_HI][CRC_LO]
//! ```
//! The CRC covers `CMD + LEN + PAYLOAD`, never the start byte.

use bytes::Bytes;
use serde::Serialize;

/// Frame start marker (always 0xAA)
pub const START_BYTE: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD: usize = 1024;

/// Header size: start + command + 2-byte length
pub const HEADER_SIZE: usize = 4;

/// Footer size: 2-byte CRC
pub const FOOTER_SIZE: usize = 2;

/// Minimum frame size (empty payload)
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + FOOTER_SIZE;

/// Maximum frame size (full payload)
pub const MAX_FRAME_SIZE: usize = MIN_FRAME_SIZE + MAX_PAYLOAD;

/// Maximum encoded length of a length-prefixed string
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Command identifiers
///
/// Values are wire constants shared with the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    // System
    Ping = 0x01,
    Pong = 0x02,
    Error = 0x03,
    Ack = 0x04,

    // LED
    LedSet = 0x10,
    LedBlink = 0x11,
    LedPattern = 0x12,

    // Sensors
    SensorRead = 0x20,
    SensorData = 0x21,
    SensorConfig = 0x22,

    // Rotary encoder
    EncoderRead = 0x30,
    EncoderData = 0x31,
    EncoderReset = 0x32,

    // OLED display
    OledClear = 0x40,
    OledText = 0x41,
    OledPixel = 0x42,
    OledLine = 0x43,
    OledRect = 0x44,
    OledBitmap = 0x45,

    // Generic typed data
    DataU8 = 0x50,
    DataI16 = 0x51,
    DataI32 = 0x52,
    DataF32 = 0x53,
    DataString = 0x54,
    DataArray = 0x55,
}

impl CommandId {
    /// Every command id, in wire order
    pub const ALL: [CommandId; 25] = [
        CommandId::Ping,
        CommandId::Pong,
        CommandId::Error,
        CommandId::Ack,
        CommandId::LedSet,
        CommandId::LedBlink,
        CommandId::LedPattern,
        CommandId::SensorRead,
        CommandId::SensorData,
        CommandId::SensorConfig,
        CommandId::EncoderRead,
        CommandId::EncoderData,
        CommandId::EncoderReset,
        CommandId::OledClear,
        CommandId::OledText,
        CommandId::OledPixel,
        CommandId::OledLine,
        CommandId::OledRect,
        CommandId::OledBitmap,
        CommandId::DataU8,
        CommandId::DataI16,
        CommandId::DataI32,
        CommandId::DataF32,
        CommandId::DataString,
        CommandId::DataArray,
    ];
}

impl From<CommandId> for u8 {
    fn from(id: CommandId) -> u8 {
        id as u8
    }
}

impl TryFrom<u8> for CommandId {
    /// The unrecognized byte
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        CommandId::ALL
            .iter()
            .copied()
            .find(|id| *id as u8 == value)
            .ok_or(value)
    }
}

/// Error codes carried as the payload of [`CommandId::Error`] frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    Ok = 0x00,
    InvalidCommand = 0x01,
    InvalidChecksum = 0x02,
    Timeout = 0x03,
    BufferOverflow = 0x04,
    InvalidParameter = 0x05,
    NotReady = 0x06,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    /// The unrecognized byte
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(ErrorCode::Ok),
            0x01 => Ok(ErrorCode::InvalidCommand),
            0x02 => Ok(ErrorCode::InvalidChecksum),
            0x03 => Ok(ErrorCode::Timeout),
            0x04 => Ok(ErrorCode::BufferOverflow),
            0x05 => Ok(ErrorCode::InvalidParameter),
            0x06 => Ok(ErrorCode::NotReady),
            other => Err(other),
        }
    }
}

/// Rotary encoder report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EncoderData {
    /// Absolute position in detents
    pub position: i16,

    /// Velocity since last report
    pub velocity: u8,

    /// Push button state
    pub button_pressed: bool,
}

/// Sensor reading report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorData {
    /// Sensor slot on the device
    pub sensor_id: u8,

    /// Raw reading
    pub value: i16,
}

/// Sensor slot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub sensor_id: u8,
    pub pin: u8,
    pub kind: u8,
}

/// Text placed on the OLED display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OledText {
    pub x: u8,
    pub y: u8,
    pub text: String,
}

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command id byte
    pub command_id: u8,

    /// Payload data
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame
    pub fn new(command_id: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self {
            command_id: command_id.into(),
            payload: payload.into(),
        }
    }

    /// Typed command id, if the byte is part of the vocabulary
    pub fn command(&self) -> Option<CommandId> {
        CommandId::try_from(self.command_id).ok()
    }

    /// Total wire size of this frame
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}
