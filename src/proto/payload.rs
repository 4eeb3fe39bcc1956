//! # Payload Builder and Parser
//!
//! Typed, big-endian field serialization for frame payloads.
//!
//! [`PayloadBuilder`] appends fields into a buffer capped at a maximum size;
//! [`PayloadParser`] reads them back in order from a borrowed slice. Every
//! operation either fully succeeds or leaves its buffer/cursor untouched.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::{MAX_PAYLOAD, MAX_STRING_LEN};
use crate::error::PayloadError;

/// Builds a payload no larger than a configured maximum
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    buffer: BytesMut,
    max_size: usize,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Create a builder capped at [`MAX_PAYLOAD`] bytes
    pub fn new() -> Self {
        Self::with_capacity_limit(MAX_PAYLOAD)
    }

    /// Create a builder capped at `max_size` bytes
    pub fn with_capacity_limit(max_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_size,
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured maximum size
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Bytes that can still be appended
    pub fn remaining_capacity(&self) -> usize {
        self.max_size.saturating_sub(self.buffer.len())
    }

    /// Discard everything written so far
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    fn ensure(&self, needed: usize) -> Result<(), PayloadError> {
        let remaining = self.remaining_capacity();
        if needed > remaining {
            return Err(PayloadError::Overflow { needed, remaining });
        }
        Ok(())
    }

    pub fn add_u8(&mut self, value: u8) -> Result<(), PayloadError> {
        self.ensure(1)?;
        self.buffer.put_u8(value);
        Ok(())
    }

    pub fn add_u16(&mut self, value: u16) -> Result<(), PayloadError> {
        self.ensure(2)?;
        self.buffer.put_u16(value);
        Ok(())
    }

    pub fn add_i16(&mut self, value: i16) -> Result<(), PayloadError> {
        self.ensure(2)?;
        self.buffer.put_i16(value);
        Ok(())
    }

    pub fn add_i32(&mut self, value: i32) -> Result<(), PayloadError> {
        self.ensure(4)?;
        self.buffer.put_i32(value);
        Ok(())
    }

    /// Append an IEEE-754 single precision value
    pub fn add_f32(&mut self, value: f32) -> Result<(), PayloadError> {
        self.ensure(4)?;
        self.buffer.put_f32(value);
        Ok(())
    }

    /// Append a UTF-8 string with a one-byte length prefix
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The encoded string is longer than 255 bytes (never truncated)
    /// - Prefix plus string would exceed the maximum size
    pub fn add_string(&mut self, value: &str) -> Result<(), PayloadError> {
        let encoded = value.as_bytes();
        if encoded.len() > MAX_STRING_LEN {
            return Err(PayloadError::StringTooLong { len: encoded.len() });
        }
        self.ensure(1 + encoded.len())?;
        self.buffer.put_u8(encoded.len() as u8);
        self.buffer.put_slice(encoded);
        Ok(())
    }

    /// Append raw bytes with no prefix
    pub fn add_bytes(&mut self, data: &[u8]) -> Result<(), PayloadError> {
        self.ensure(data.len())?;
        self.buffer.put_slice(data);
        Ok(())
    }

    /// Snapshot of the bytes written so far
    ///
    /// The builder is left intact: later appends continue after the
    /// snapshotted bytes.
    pub fn finalize(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buffer)
    }
}

/// Reads typed fields from a payload in sequence
#[derive(Debug, Clone)]
pub struct PayloadParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PayloadParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Current read cursor
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_data(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Rewind to the start of the payload
    pub fn reset(&mut self) {
        self.position = 0;
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], PayloadError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(PayloadError::NotEnoughBytes { needed, remaining });
        }
        let slice = &self.buffer[self.position..self.position + needed];
        self.position += needed;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, PayloadError> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, PayloadError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, PayloadError> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, PayloadError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32, PayloadError> {
        let b = self.take(4)?;
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a length-prefixed string
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD. If the body is
    /// shorter than its declared length the cursor is restored to before
    /// the length byte.
    pub fn read_string(&mut self) -> Result<String, PayloadError> {
        let start = self.position;
        let len = self.read_u8()? as usize;

        match self.take(len) {
            Ok(body) => Ok(String::from_utf8_lossy(body).into_owned()),
            Err(e) => {
                self.position = start;
                Err(e)
            }
        }
    }

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PayloadError> {
        self.take(len)
    }
}
