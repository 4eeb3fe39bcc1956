//! # CRC-16/CCITT-FALSE Implementation
//!
//! Frame integrity checksum for the MCU link protocol.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0xFFFF
//! **Reflection**: none, MSB-first
//! **Final XOR**: none

/// CRC-16 CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// CRC register initial value
const CRC16_INIT: u16 = 0xFFFF;

/// Precomputed CRC16 lookup table, indexed by the register's high byte
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC-16/CCITT-FALSE checksum using lookup table
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for (Command + Length + Payload)
///
/// # Returns
///
/// * `u16` - Calculated checksum
///
/// # Examples
///
/// ```
/// use mcu_link::proto::crc::crc16_ccitt;
///
/// assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
/// assert_eq!(crc16_ccitt(&[]), 0xFFFF);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }

    crc
}

/// Calculate CRC-16/CCITT-FALSE bit by bit (slow, for verification)
///
/// XORs each byte into the high byte of the register, then runs eight
/// shift/XOR rounds. Used to check the lookup table.
#[allow(dead_code)]
fn crc16_ccitt_slow(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
