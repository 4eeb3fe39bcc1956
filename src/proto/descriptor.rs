//! # Command Descriptors and Device Responses
//!
//! JSON-facing side of the protocol. A [`CommandDescriptor`] is the
//! `{"type": "...", ...}` object an operator console queues for the device;
//! a [`DeviceResponse`] is a decoded frame classified for reporting back.

use serde::{Deserialize, Serialize};

use super::decoder::{parse_encoder_data, parse_error_code, parse_sensor_data};
use super::encoder::*;
use super::protocol::*;
use crate::error::Result;

/// A command requested by an operator, tagged by `"type"`
///
/// Unknown fields such as `description` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandDescriptor {
    Ping,
    LedSet { state: bool },
    LedOn,
    LedOff,
    LedBlink { duration: u16 },
    OledText { x: u8, y: u8, text: String },
    OledClear,
    EncoderRead,
    EncoderReset,
    SensorRead { sensor_id: u8 },
    SensorConfig { sensor_id: u8, pin: u8, kind: u8 },
}

impl CommandDescriptor {
    /// Parse a descriptor from a JSON object
    ///
    /// # Examples
    ///
    /// ```
    /// use mcu_link::proto::descriptor::CommandDescriptor;
    ///
    /// let cmd = CommandDescriptor::from_json(r#"{"type":"led_blink","duration":500}"#).unwrap();
    /// assert_eq!(cmd, CommandDescriptor::LedBlink { duration: 500 });
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Command id this descriptor encodes to
    pub fn command_id(&self) -> CommandId {
        match self {
            CommandDescriptor::Ping => CommandId::Ping,
            CommandDescriptor::LedSet { .. }
            | CommandDescriptor::LedOn
            | CommandDescriptor::LedOff => CommandId::LedSet,
            CommandDescriptor::LedBlink { .. } => CommandId::LedBlink,
            CommandDescriptor::OledText { .. } => CommandId::OledText,
            CommandDescriptor::OledClear => CommandId::OledClear,
            CommandDescriptor::EncoderRead => CommandId::EncoderRead,
            CommandDescriptor::EncoderReset => CommandId::EncoderReset,
            CommandDescriptor::SensorRead { .. } => CommandId::SensorRead,
            CommandDescriptor::SensorConfig { .. } => CommandId::SensorConfig,
        }
    }

    /// Encode into a wire frame
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        match self {
            CommandDescriptor::Ping => Ok(build_ping()),
            CommandDescriptor::LedSet { state } => build_led_set(*state),
            CommandDescriptor::LedOn => build_led_set(true),
            CommandDescriptor::LedOff => build_led_set(false),
            CommandDescriptor::LedBlink { duration } => build_led_blink(*duration),
            CommandDescriptor::OledText { x, y, text } => build_oled_text(*x, *y, text),
            CommandDescriptor::OledClear => Ok(build_oled_clear()),
            CommandDescriptor::EncoderRead => Ok(build_encoder_read()),
            CommandDescriptor::EncoderReset => Ok(build_encoder_reset()),
            CommandDescriptor::SensorRead { sensor_id } => build_sensor_read(*sensor_id),
            CommandDescriptor::SensorConfig { sensor_id, pin, kind } => {
                build_sensor_config(&SensorConfig {
                    sensor_id: *sensor_id,
                    pin: *pin,
                    kind: *kind,
                })
            }
        }
    }
}

/// A frame received from the device, classified by command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceResponse {
    Pong,
    Ack,
    /// `code` is `None` when the payload is missing or not a known code
    Error { code: Option<ErrorCode>, raw: Option<u8> },
    SensorData(SensorData),
    EncoderData(EncoderData),
    /// Anything else, or a known report whose payload failed to parse
    Other { command_id: u8, payload: String },
}

impl DeviceResponse {
    /// Classify a decoded frame
    pub fn from_frame(frame: &Frame) -> Self {
        let parsed = match frame.command() {
            Some(CommandId::Pong) => Some(DeviceResponse::Pong),
            Some(CommandId::Ack) => Some(DeviceResponse::Ack),
            Some(CommandId::Error) => Some(DeviceResponse::Error {
                code: parse_error_code(&frame.payload).ok(),
                raw: frame.payload.first().copied(),
            }),
            Some(CommandId::SensorData) => parse_sensor_data(&frame.payload)
                .ok()
                .map(DeviceResponse::SensorData),
            Some(CommandId::EncoderData) => parse_encoder_data(&frame.payload)
                .ok()
                .map(DeviceResponse::EncoderData),
            _ => None,
        };

        parsed.unwrap_or_else(|| DeviceResponse::Other {
            command_id: frame.command_id,
            payload: hex::encode(&frame.payload),
        })
    }

    /// Serialize as a single-line JSON object
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
