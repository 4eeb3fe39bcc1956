//! # Frame Decoder
//!
//! Validates received frames and parses command-specific payloads.
//!
//! Response parsers treat leading fields as mandatory and trailing fields as
//! optional: a shorter payload from older firmware still parses, with the
//! missing fields set to their defaults.

use bytes::Bytes;
use tracing::trace;

use super::crc::crc16_ccitt;
use super::payload::PayloadParser;
use super::protocol::*;
use crate::error::{FrameError, PayloadError};

/// Decode a complete frame
///
/// # Arguments
///
/// * `data` - Candidate frame bytes (start, command, length, payload, crc)
///
/// # Returns
///
/// * `Result<Frame, FrameError>` - Decoded frame, or the check that rejected it
///
/// # Errors
///
/// Returns error if:
/// - Buffer is shorter than 6 bytes
/// - Start byte is incorrect
/// - Declared length runs past the end of the buffer
/// - CRC check fails
///
/// Bytes after the checksum are ignored. The input is never modified.
pub fn decode_frame(data: &[u8]) -> Result<Frame, FrameError> {
    if data.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort { len: data.len() });
    }

    if data[0] != START_BYTE {
        return Err(FrameError::InvalidStartByte(data[0]));
    }

    let command_id = data[1];
    let length = u16::from_be_bytes([data[2], data[3]]) as usize;

    let expected = MIN_FRAME_SIZE + length;
    if data.len() < expected {
        return Err(FrameError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let crc_offset = HEADER_SIZE + length;
    let received_crc = u16::from_be_bytes([data[crc_offset], data[crc_offset + 1]]);

    // CRC over Command + Length + Payload (everything except start and CRC)
    let calculated_crc = crc16_ccitt(&data[1..crc_offset]);

    if calculated_crc != received_crc {
        return Err(FrameError::ChecksumMismatch {
            expected: calculated_crc,
            actual: received_crc,
        });
    }

    trace!("Decoded frame cmd=0x{:02X} ({} byte payload)", command_id, length);

    Ok(Frame {
        command_id,
        payload: Bytes::copy_from_slice(&data[HEADER_SIZE..crc_offset]),
    })
}

/// Parse ENCODER_DATA payload
///
/// Position is mandatory. Velocity defaults to 0 and the button to released
/// when the payload stops early.
pub fn parse_encoder_data(payload: &[u8]) -> Result<EncoderData, PayloadError> {
    let mut parser = PayloadParser::new(payload);
    let position = parser.read_i16()?;
    let velocity = parser.read_u8().unwrap_or(0);
    let button_pressed = parser.read_u8().map(|b| b == 1).unwrap_or(false);

    Ok(EncoderData {
        position,
        velocity,
        button_pressed,
    })
}

/// Parse SENSOR_DATA payload: `[sensor_id:u8, value:i16]`
pub fn parse_sensor_data(payload: &[u8]) -> Result<SensorData, PayloadError> {
    let mut parser = PayloadParser::new(payload);
    let sensor_id = parser.read_u8()?;
    let value = parser.read_i16()?;

    Ok(SensorData { sensor_id, value })
}

/// Parse SENSOR_CONFIG payload: `[sensor_id:u8, pin:u8, kind:u8]`
pub fn parse_sensor_config(payload: &[u8]) -> Result<SensorConfig, PayloadError> {
    let mut parser = PayloadParser::new(payload);

    Ok(SensorConfig {
        sensor_id: parser.read_u8()?,
        pin: parser.read_u8()?,
        kind: parser.read_u8()?,
    })
}

/// Parse ERROR payload: `[code:u8]`
pub fn parse_error_code(payload: &[u8]) -> Result<ErrorCode, PayloadError> {
    let mut parser = PayloadParser::new(payload);
    let raw = parser.read_u8()?;

    ErrorCode::try_from(raw).map_err(|value| PayloadError::InvalidValue {
        field: "error_code",
        value,
    })
}

/// Parse LED_SET payload; any non-zero state means on
pub fn parse_led_set(payload: &[u8]) -> Result<bool, PayloadError> {
    let mut parser = PayloadParser::new(payload);
    Ok(parser.read_u8()? != 0)
}

/// Parse LED_BLINK payload: `[duration_ms:u16]`
pub fn parse_led_blink(payload: &[u8]) -> Result<u16, PayloadError> {
    PayloadParser::new(payload).read_u16()
}

/// Parse OLED_TEXT payload: `[x:u8, y:u8, text:string]`
pub fn parse_oled_text(payload: &[u8]) -> Result<OledText, PayloadError> {
    let mut parser = PayloadParser::new(payload);

    Ok(OledText {
        x: parser.read_u8()?,
        y: parser.read_u8()?,
        text: parser.read_string()?,
    })
}
