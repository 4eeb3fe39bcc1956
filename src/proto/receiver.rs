//! # Streaming Frame Receiver
//!
//! Byte-at-a-time state machine that picks frames out of a continuous stream.
//!
//! Bytes are skipped until a start marker appears. A declared length above
//! [`MAX_PAYLOAD`] or a checksum mismatch drops the partial frame, and every
//! byte after its start marker is scanned again, so a stray `0xAA` never
//! swallows the real frames that follow it.

use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use super::crc::crc16_ccitt;
use super::protocol::*;
use crate::error::FrameError;

/// Command byte plus the two length bytes
const FRAME_HEADER_LEN: usize = HEADER_SIZE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    /// Waiting for START byte
    WaitStart,
    /// Got START, waiting for command id
    WaitCommand,
    WaitLengthHigh,
    WaitLengthLow,
    /// Reading payload bytes
    Payload,
    WaitCrcHigh,
    WaitCrcLow,
}

/// Reassembles frames from a byte stream
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: RxState,
    length: usize,
    /// Bytes after the start marker of the frame in progress
    buffer: BytesMut,
    /// Bytes waiting to be scanned, ahead of anything fed later
    backlog: VecDeque<u8>,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self {
            state: RxState::WaitStart,
            length: 0,
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
            backlog: VecDeque::new(),
        }
    }

    /// Drop any partial frame and every byte not yet scanned
    pub fn reset(&mut self) {
        self.clear_frame();
        self.backlog.clear();
    }

    /// True while a frame is partially received
    pub fn in_frame(&self) -> bool {
        self.state != RxState::WaitStart
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is received,
    /// `Ok(None)` when more bytes are needed, or `Err` when the partial frame
    /// was rejected.
    ///
    /// After a rejection the bytes of the dropped frame are queued for
    /// rescanning and are worked through on the following calls. Use
    /// [`poll`](Self::poll) to drain them without feeding new input.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        self.backlog.push_back(byte);
        self.poll()
    }

    /// Scan queued bytes until one completes or rejects a frame
    ///
    /// `Ok(None)` means the queue is empty.
    pub fn poll(&mut self) -> Result<Option<Frame>, FrameError> {
        while let Some(byte) = self.backlog.pop_front() {
            if let Some(result) = self.step(byte).transpose() {
                return result.map(Some);
            }
        }
        Ok(None)
    }

    /// Feed a chunk of bytes, collecting every valid frame
    ///
    /// Rejected frames are logged and skipped.
    pub fn feed_all(&mut self, data: &[u8]) -> Vec<Frame> {
        self.backlog.extend(data);

        let mut frames = Vec::new();
        loop {
            match self.poll() {
                Ok(Some(frame)) => {
                    debug!(
                        "Received frame cmd=0x{:02X} ({} byte payload)",
                        frame.command_id,
                        frame.payload.len()
                    );
                    frames.push(frame);
                }
                Ok(None) => break,
                Err(e) => warn!("Dropped frame: {}", e),
            }
        }

        frames
    }

    /// Give up on the frame in progress after an idle gap
    ///
    /// Its bytes after the start marker are rescanned and any frames found
    /// in them are returned. Every buffered byte is stale at this point, so
    /// a partial frame left over from the rescan is abandoned too.
    pub fn expire(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();

        while self.in_frame() {
            warn!(
                "Receive timeout: abandoning partial frame ({} bytes)",
                self.buffer.len() + 1
            );
            self.requeue_partial();
            frames.extend(self.feed_all(&[]));
        }

        frames
    }

    fn step(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.state == RxState::WaitStart {
            if byte == START_BYTE {
                self.state = RxState::WaitCommand;
            }
            return Ok(None);
        }

        self.buffer.put_u8(byte);

        self.state = match self.state {
            RxState::WaitCommand => RxState::WaitLengthHigh,
            RxState::WaitLengthHigh => RxState::WaitLengthLow,
            RxState::WaitLengthLow => {
                self.length = u16::from_be_bytes([self.buffer[1], self.buffer[2]]) as usize;
                if self.length > MAX_PAYLOAD {
                    let size = self.length;
                    return Err(self.abandon(FrameError::PayloadTooLarge {
                        size,
                        max: MAX_PAYLOAD,
                    }));
                }
                if self.length == 0 {
                    RxState::WaitCrcHigh
                } else {
                    RxState::Payload
                }
            }
            RxState::Payload if self.buffer.len() < FRAME_HEADER_LEN + self.length => {
                RxState::Payload
            }
            RxState::Payload => RxState::WaitCrcHigh,
            RxState::WaitCrcHigh => RxState::WaitCrcLow,
            RxState::WaitCrcLow => return self.finish(),
            RxState::WaitStart => RxState::WaitStart,
        };

        Ok(None)
    }

    /// Check the CRC of a fully buffered frame
    fn finish(&mut self) -> Result<Option<Frame>, FrameError> {
        // CRC over Command + Length + Payload
        let crc_offset = FRAME_HEADER_LEN + self.length;
        let received = u16::from_be_bytes([self.buffer[crc_offset], self.buffer[crc_offset + 1]]);
        let calculated = crc16_ccitt(&self.buffer[..crc_offset]);

        if calculated != received {
            return Err(self.abandon(FrameError::ChecksumMismatch {
                expected: calculated,
                actual: received,
            }));
        }

        let frame = Frame {
            command_id: self.buffer[0],
            payload: Bytes::copy_from_slice(&self.buffer[FRAME_HEADER_LEN..crc_offset]),
        };
        self.clear_frame();
        Ok(Some(frame))
    }

    fn abandon(&mut self, error: FrameError) -> FrameError {
        self.requeue_partial();
        error
    }

    /// Put the partial frame's bytes, minus its start marker, back at the
    /// front of the scan queue
    fn requeue_partial(&mut self) {
        for &byte in self.buffer.iter().rev() {
            self.backlog.push_front(byte);
        }
        self.clear_frame();
    }

    fn clear_frame(&mut self) {
        self.state = RxState::WaitStart;
        self.length = 0;
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::encoder::{
        build_ack, build_led_blink, build_oled_text, build_ping, build_pong, encode_frame,
    };

    fn feed_bytes(rx: &mut FrameReceiver, data: &[u8]) -> Vec<Result<Option<Frame>, FrameError>> {
        data.iter().map(|&b| rx.feed(b)).collect()
    }

    #[test]
    fn test_receive_single_frame() {
        let mut rx = FrameReceiver::new();
        let frames = rx.feed_all(&build_led_blink(500).unwrap());

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command(), Some(CommandId::LedBlink));
        assert_eq!(frames[0].payload.to_vec(), vec![0x01, 0xF4]);
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_receive_frame_byte_by_byte() {
        let mut rx = FrameReceiver::new();
        let frame = build_ping();
        let results = feed_bytes(&mut rx, &frame);

        for result in &results[..frame.len() - 1] {
            assert_eq!(result, &Ok(None));
        }
        let last = results[frame.len() - 1].clone().unwrap().unwrap();
        assert_eq!(last.command(), Some(CommandId::Ping));
    }

    #[test]
    fn test_receive_skips_leading_garbage() {
        let mut rx = FrameReceiver::new();
        let mut stream = vec![0x00, 0x13, 0x37];
        stream.extend_from_slice(&build_ping());

        let frames = rx.feed_all(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command_id, 0x01);
    }

    #[test]
    fn test_receive_back_to_back_frames() {
        let mut rx = FrameReceiver::new();
        let mut stream = build_ping();
        stream.extend_from_slice(&build_oled_text(1, 2, "abc").unwrap());
        stream.extend_from_slice(&build_led_blink(250).unwrap());

        let frames = rx.feed_all(&stream);
        let ids: Vec<u8> = frames.iter().map(|f| f.command_id).collect();
        assert_eq!(ids, vec![0x01, 0x41, 0x11]);
    }

    #[test]
    fn test_receive_split_across_chunks() {
        let mut rx = FrameReceiver::new();
        let frame = build_oled_text(0, 0, "split").unwrap();
        let (first, second) = frame.split_at(5);

        assert!(rx.feed_all(first).is_empty());
        assert!(rx.in_frame());
        let frames = rx.feed_all(second);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_receive_oversized_length_resets() {
        let mut rx = FrameReceiver::new();
        let results = feed_bytes(&mut rx, &[START_BYTE, 0x55, 0x04, 0x01]);

        assert_eq!(
            results[3],
            Err(FrameError::PayloadTooLarge { size: 1025, max: MAX_PAYLOAD })
        );
        assert!(!rx.in_frame());

        // Receiver recovers on the next frame
        assert_eq!(rx.feed_all(&build_ping()).len(), 1);
    }

    #[test]
    fn test_receive_crc_mismatch_resets() {
        let mut rx = FrameReceiver::new();
        let mut frame = build_led_blink(500).unwrap();
        frame[5] ^= 0x80;

        let results = feed_bytes(&mut rx, &frame);
        assert!(matches!(
            results.last(),
            Some(Err(FrameError::ChecksumMismatch { .. }))
        ));
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_receive_max_payload() {
        let mut rx = FrameReceiver::new();
        let payload = vec![0xAA; MAX_PAYLOAD];
        let frame = encode_frame(CommandId::DataArray, &payload).unwrap();

        let frames = rx.feed_all(&frame);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_stray_start_byte_does_not_swallow_frames() {
        let mut rx = FrameReceiver::new();
        assert!(rx.feed_all(&[START_BYTE]).is_empty());

        // The stray marker reads the first ack as a 1024 byte header; once
        // that false frame fails its CRC the real frames are rescanned
        let mut stream = Vec::new();
        for _ in 0..100 {
            stream.extend_from_slice(&build_ack());
            stream.extend_from_slice(&build_pong());
        }

        let frames = rx.feed_all(&stream);
        assert_eq!(frames.len(), 200);
        assert!(frames.iter().step_by(2).all(|f| f.command() == Some(CommandId::Ack)));
        assert!(frames.iter().skip(1).step_by(2).all(|f| f.command() == Some(CommandId::Pong)));
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_frame_inside_rejected_frame_is_recovered() {
        let mut rx = FrameReceiver::new();
        // False header declaring a 6 byte payload that holds a whole ping
        let mut stream = vec![START_BYTE, 0x55, 0x00, 0x06];
        stream.extend_from_slice(&build_ping());
        stream.extend_from_slice(&[0x00, 0x00]);

        let frames = rx.feed_all(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command(), Some(CommandId::Ping));
    }

    #[test]
    fn test_oversized_length_rescans_header_bytes() {
        let mut rx = FrameReceiver::new();
        // Stray marker followed by a real frame whose cmd/length bytes
        // form an oversized length
        let mut stream = vec![START_BYTE];
        stream.extend_from_slice(&build_led_blink(500).unwrap());

        let frames = rx.feed_all(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command(), Some(CommandId::LedBlink));
    }

    #[test]
    fn test_feed_reports_rejection_then_recovers() {
        let mut rx = FrameReceiver::new();
        let mut stream = vec![START_BYTE, 0x55, 0x04, 0x01];
        stream.extend_from_slice(&build_ping());

        let results = feed_bytes(&mut rx, &stream);
        assert!(results.iter().any(|r| r.is_err()));
        let frames: Vec<Frame> = results.into_iter().filter_map(|r| r.ok().flatten()).collect();
        assert_eq!(frames.len(), 1);
        assert!(rx.poll().unwrap().is_none());
    }

    #[test]
    fn test_expire_rescans_partial_frame() {
        let mut rx = FrameReceiver::new();
        let mut stream = vec![START_BYTE];
        stream.extend_from_slice(&build_ack());

        // Stray marker leaves the receiver waiting for a long payload
        assert!(rx.feed_all(&stream).is_empty());
        assert!(rx.in_frame());

        let frames = rx.expire();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command(), Some(CommandId::Ack));
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_expire_handles_nested_stray_markers() {
        let mut rx = FrameReceiver::new();
        // Two stray markers, each declaring a payload longer than what follows
        let mut stream = vec![START_BYTE, 0x10, 0x01, 0x00];
        stream.extend_from_slice(&build_ping());
        stream.extend_from_slice(&[START_BYTE, 0x20, 0x02, 0x00]);
        stream.extend_from_slice(&build_ack());

        assert!(rx.feed_all(&stream).is_empty());

        let ids: Vec<u8> = rx.expire().iter().map(|f| f.command_id).collect();
        assert_eq!(ids, vec![0x01, 0x04]);
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_expire_when_idle_is_noop() {
        let mut rx = FrameReceiver::new();
        assert!(rx.expire().is_empty());
        assert!(!rx.in_frame());
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut rx = FrameReceiver::new();
        rx.feed_all(&build_led_blink(500).unwrap()[..4]);
        assert!(rx.in_frame());

        rx.reset();
        assert!(!rx.in_frame());
        assert_eq!(rx.feed_all(&build_ping()).len(), 1);
    }
}
