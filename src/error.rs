//! # Error Types
//!
//! Custom error types for MCU Link using `thiserror`.
//!
//! Codec-level failures are split into [`PayloadError`] (typed field access
//! inside a payload) and [`FrameError`] (framing and integrity checks) so a
//! caller can tell exactly which check rejected its input.

use thiserror::Error;

/// Errors raised while building or parsing a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Append would exceed the builder's maximum size
    #[error("payload overflow: need {needed} bytes, {remaining} remaining")]
    Overflow { needed: usize, remaining: usize },

    /// String encoding does not fit in a one-byte length prefix
    #[error("string too long: {len} bytes (max 255)")]
    StringTooLong { len: usize },

    /// Read requested more bytes than remain in the payload
    #[error("not enough bytes: need {needed}, {remaining} remaining")]
    NotEnoughBytes { needed: usize, remaining: usize },

    /// A field decoded to a value outside its closed set
    #[error("invalid value 0x{value:02X} for {field}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// Errors raised while encoding or decoding a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Payload exceeds the protocol maximum
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Buffer shorter than the minimum frame
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },

    /// First byte is not the start marker
    #[error("invalid start byte: 0x{0:02X}")]
    InvalidStartByte(u8),

    /// Declared length runs past the end of the buffer
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Trailing checksum does not match the recomputed one
    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },
}

/// Main error type for MCU Link
#[derive(Debug, Error)]
pub enum McuLinkError {
    /// Frame codec errors
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Payload codec errors
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Command descriptor errors
    #[error("invalid command descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed hex input
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MCU Link
pub type Result<T> = std::result::Result<T, McuLinkError>;
