//! # Frame Encoder
//!
//! Wraps command ids and payloads into checksummed frames, plus builders for
//! every command the host and device exchange.

use tracing::trace;

use super::crc::crc16_ccitt;
use super::payload::PayloadBuilder;
use super::protocol::*;
use crate::error::{FrameError, Result};

/// Encode a command id and payload into a complete frame
///
/// # Arguments
///
/// * `command_id` - Command id (a [`CommandId`] or raw byte)
/// * `payload` - Payload data (max 1024 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>, FrameError>` - Frame bytes: start + command + length + payload + CRC
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if the payload exceeds [`MAX_PAYLOAD`]
///
/// # Examples
///
/// ```
/// use mcu_link::proto::encoder::encode_frame;
/// use mcu_link::proto::protocol::CommandId;
///
/// let frame = encode_frame(CommandId::Ping, &[]).unwrap();
/// assert_eq!(frame, vec![0xAA, 0x01, 0x00, 0x00, 0xFB, 0xAC]);
/// ```
pub fn encode_frame(
    command_id: impl Into<u8>,
    payload: &[u8],
) -> std::result::Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    Ok(write_frame(command_id.into(), payload))
}

/// Lay out a frame whose payload is already known to fit
fn write_frame(command_id: u8, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() as u16).to_be_bytes();

    let mut frame = Vec::with_capacity(MIN_FRAME_SIZE + payload.len());
    frame.push(START_BYTE);
    frame.push(command_id);
    frame.extend_from_slice(&length);
    frame.extend_from_slice(payload);

    // CRC over Command + Length + Payload (everything after the start byte)
    let crc = crc16_ccitt(&frame[1..]);
    frame.extend_from_slice(&crc.to_be_bytes());

    trace!("Encoded frame cmd=0x{:02X} ({} bytes)", command_id, frame.len());
    frame
}

/// Encode a command with an empty payload
fn encode_empty(command: CommandId) -> Vec<u8> {
    write_frame(command.into(), &[])
}

/// Encode a payload produced by a builder
fn encode_built(command: CommandId, builder: &PayloadBuilder) -> Result<Vec<u8>> {
    Ok(encode_frame(command, &builder.finalize())?)
}

/// Build PING command
pub fn build_ping() -> Vec<u8> {
    encode_empty(CommandId::Ping)
}

/// Build PONG reply
pub fn build_pong() -> Vec<u8> {
    encode_empty(CommandId::Pong)
}

/// Build ACK reply
pub fn build_ack() -> Vec<u8> {
    encode_empty(CommandId::Ack)
}

/// Build ERROR reply: `[code:u8]`
pub fn build_error(code: ErrorCode) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(code.into())?;
    encode_built(CommandId::Error, &builder)
}

/// Build LED_SET command: `[state:u8]`
pub fn build_led_set(on: bool) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(u8::from(on))?;
    encode_built(CommandId::LedSet, &builder)
}

/// Build LED_BLINK command: `[duration_ms:u16]`
pub fn build_led_blink(duration_ms: u16) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u16(duration_ms)?;
    encode_built(CommandId::LedBlink, &builder)
}

/// Build SENSOR_READ command: `[sensor_id:u8]`
pub fn build_sensor_read(sensor_id: u8) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(sensor_id)?;
    encode_built(CommandId::SensorRead, &builder)
}

/// Build SENSOR_CONFIG command: `[sensor_id:u8, pin:u8, kind:u8]`
pub fn build_sensor_config(config: &SensorConfig) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(config.sensor_id)?;
    builder.add_u8(config.pin)?;
    builder.add_u8(config.kind)?;
    encode_built(CommandId::SensorConfig, &builder)
}

/// Build SENSOR_DATA report: `[sensor_id:u8, value:i16]`
pub fn build_sensor_data(data: &SensorData) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(data.sensor_id)?;
    builder.add_i16(data.value)?;
    encode_built(CommandId::SensorData, &builder)
}

/// Build ENCODER_READ command
pub fn build_encoder_read() -> Vec<u8> {
    encode_empty(CommandId::EncoderRead)
}

/// Build ENCODER_RESET command
pub fn build_encoder_reset() -> Vec<u8> {
    encode_empty(CommandId::EncoderReset)
}

/// Build ENCODER_DATA report: `[position:i16, velocity:u8, button:u8]`
pub fn build_encoder_data(data: &EncoderData) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_i16(data.position)?;
    builder.add_u8(data.velocity)?;
    builder.add_u8(u8::from(data.button_pressed))?;
    encode_built(CommandId::EncoderData, &builder)
}

/// Build OLED_CLEAR command
pub fn build_oled_clear() -> Vec<u8> {
    encode_empty(CommandId::OledClear)
}

/// Build OLED_TEXT command: `[x:u8, y:u8, text:string]`
///
/// # Errors
///
/// Returns error if the text encodes to more than 255 bytes
///
/// # Examples
///
/// ```
/// use mcu_link::proto::encoder::build_oled_text;
///
/// let frame = build_oled_text(10, 20, "Hi").unwrap();
/// assert_eq!(&frame[4..9], &[0x0A, 0x14, 0x02, b'H', b'i']);
/// ```
pub fn build_oled_text(x: u8, y: u8, text: &str) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(x)?;
    builder.add_u8(y)?;
    builder.add_string(text)?;
    encode_built(CommandId::OledText, &builder)
}

/// Build DATA_UINT8 frame
pub fn build_data_u8(value: u8) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_u8(value)?;
    encode_built(CommandId::DataU8, &builder)
}

/// Build DATA_INT16 frame
pub fn build_data_i16(value: i16) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_i16(value)?;
    encode_built(CommandId::DataI16, &builder)
}

/// Build DATA_INT32 frame
pub fn build_data_i32(value: i32) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_i32(value)?;
    encode_built(CommandId::DataI32, &builder)
}

/// Build DATA_FLOAT frame
pub fn build_data_f32(value: f32) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_f32(value)?;
    encode_built(CommandId::DataF32, &builder)
}

/// Build DATA_STRING frame
pub fn build_data_string(value: &str) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_string(value)?;
    encode_built(CommandId::DataString, &builder)
}

/// Build DATA_ARRAY frame from raw bytes
pub fn build_data_array(data: &[u8]) -> Result<Vec<u8>> {
    let mut builder = PayloadBuilder::new();
    builder.add_bytes(data)?;
    encode_built(CommandId::DataArray, &builder)
}
