//! # MCU Link Library
//!
//! Command and query a microcontroller peripheral set (LEDs, OLED display,
//! rotary encoder, sensors) over an unreliable byte stream.
//!
//! This library provides the framing/codec layer: frame construction,
//! CRC-16/CCITT-FALSE integrity checks, typed payload serialization and the
//! command vocabulary carried inside frames. The [`bridge`] module wires the
//! codec to line-oriented text for the `mcu-link` binary.

pub mod bridge;
pub mod config;
pub mod error;
pub mod proto;
