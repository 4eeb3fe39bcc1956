//! # Line Bridge
//!
//! Line-oriented translation between operator-facing text and wire frames.
//!
//! A JSON line is a [`CommandDescriptor`] and produces one hex-encoded frame
//! to send to the device. A hex line is raw bytes received from the device;
//! it is run through a [`FrameReceiver`] and each complete frame produces one
//! JSON [`DeviceResponse`]. The receiver persists across lines, so a frame
//! may arrive split over several lines, but a partial frame left idle longer
//! than the receive timeout is abandoned and its bytes rescanned.

use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, InputFormat};
use crate::error::{FrameError, Result};
use crate::proto::descriptor::{CommandDescriptor, DeviceResponse};
use crate::proto::protocol::{Frame, MIN_FRAME_SIZE};
use crate::proto::receiver::FrameReceiver;

/// Stateful translator between text lines and frames
#[derive(Debug)]
pub struct Bridge {
    config: Config,
    receiver: FrameReceiver,
    /// When received bytes last arrived
    last_rx: Option<Instant>,
    frames_sent: u64,
    frames_received: u64,
}

impl Bridge {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            receiver: FrameReceiver::new(),
            last_rx: None,
            frames_sent: 0,
            frames_received: 0,
        }
    }

    /// Configured receive timeout, `None` when disabled
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.config.protocol.receive_timeout()
    }

    /// True while a received frame is incomplete
    pub fn awaiting_frame(&self) -> bool {
        self.receiver.in_frame()
    }

    /// Frames encoded from descriptors so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Valid frames received so far
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Translate one input line into zero or more output lines
    ///
    /// # Errors
    ///
    /// Returns error if the line is not a valid descriptor or hex string, or
    /// if an encoded command exceeds the device's payload limit.
    pub fn handle_line(&mut self, line: &str) -> Result<Vec<String>> {
        self.handle_line_at(line, Instant::now())
    }

    /// Same as [`handle_line`](Self::handle_line) with an explicit arrival time
    pub fn handle_line_at(&mut self, line: &str, now: Instant) -> Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let is_json = match self.config.bridge.input_format {
            InputFormat::Auto => line.starts_with('{'),
            InputFormat::Json => true,
            InputFormat::Hex => false,
        };

        if is_json {
            Ok(vec![self.encode_command(line)?])
        } else {
            self.decode_bytes(line, now)
        }
    }

    /// Abandon an incomplete received frame and report anything recovered
    /// from its bytes
    pub fn flush(&mut self) -> Result<Vec<String>> {
        let frames = self.receiver.expire();
        self.respond(frames)
    }

    fn encode_command(&mut self, json: &str) -> Result<String> {
        let command = CommandDescriptor::from_json(json)?;
        let frame = command.to_frame()?;

        let payload_len = frame.len() - MIN_FRAME_SIZE;
        let max = self.config.protocol.max_payload_size;
        if payload_len > max {
            return Err(FrameError::PayloadTooLarge { size: payload_len, max }.into());
        }

        let encoded = hex::encode_upper(&frame);
        if self.config.logging.hex_dump {
            debug!("TX {}", encoded);
        }
        info!("Encoded {:?} ({} bytes)", command.command_id(), frame.len());

        self.frames_sent += 1;
        Ok(encoded)
    }

    fn decode_bytes(&mut self, text: &str, now: Instant) -> Result<Vec<String>> {
        let compact: String = text.split_whitespace().collect();
        let data = hex::decode(compact)?;

        if self.config.logging.hex_dump {
            debug!("RX {}", hex::encode_upper(&data));
        }

        let mut frames = Vec::new();
        if let (Some(timeout), Some(last)) = (self.receive_timeout(), self.last_rx) {
            if self.receiver.in_frame() && now.saturating_duration_since(last) > timeout {
                frames.extend(self.receiver.expire());
            }
        }
        self.last_rx = Some(now);

        frames.extend(self.receiver.feed_all(&data));
        self.respond(frames)
    }

    fn respond(&mut self, frames: Vec<Frame>) -> Result<Vec<String>> {
        let max = self.config.protocol.max_payload_size;
        let mut responses = Vec::new();

        for frame in frames {
            if frame.payload.len() > max {
                warn!(
                    "Dropped frame cmd=0x{:02X}: payload {} exceeds limit {}",
                    frame.command_id,
                    frame.payload.len(),
                    max
                );
                continue;
            }

            self.frames_received += 1;
            responses.push(DeviceResponse::from_frame(&frame).to_json()?);
        }

        Ok(responses)
    }
}
