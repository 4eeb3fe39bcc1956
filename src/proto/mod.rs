//! # MCU Link Protocol Module
//!
//! Implementation of the binary framing protocol spoken between the host and
//! the peripheral controller.
//!
//! This module handles:
//! - Frame encoding and validation (start byte, big-endian length, CRC-16)
//! - Typed payload building and parsing
//! - Command vocabulary builders and response parsers
//! - Stream synchronization for byte-at-a-time receive paths
//! - JSON command descriptors and device responses

pub mod protocol;
pub mod crc;
pub mod payload;
pub mod encoder;
pub mod decoder;
pub mod receiver;
pub mod descriptor;
