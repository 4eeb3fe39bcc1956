//! Property tests for the frame codec and payload serializer.

use proptest::prelude::*;

use mcu_link::error::{FrameError, PayloadError};
use mcu_link::proto::decoder::decode_frame;
use mcu_link::proto::encoder::encode_frame;
use mcu_link::proto::payload::{PayloadBuilder, PayloadParser};
use mcu_link::proto::protocol::{MAX_PAYLOAD, MAX_STRING_LEN, START_BYTE};
use mcu_link::proto::receiver::FrameReceiver;

fn payload_strategy(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max)
}

/// Append operations the builder supports, with their encoded width
#[derive(Debug, Clone)]
enum Append {
    U8(u8),
    I16(i16),
    I32(i32),
    F32(f32),
    Str(String),
    Bytes(Vec<u8>),
}

impl Append {
    fn apply(&self, builder: &mut PayloadBuilder) -> Result<(), PayloadError> {
        match self {
            Append::U8(v) => builder.add_u8(*v),
            Append::I16(v) => builder.add_i16(*v),
            Append::I32(v) => builder.add_i32(*v),
            Append::F32(v) => builder.add_f32(*v),
            Append::Str(s) => builder.add_string(s),
            Append::Bytes(b) => builder.add_bytes(b),
        }
    }
}

fn append_strategy() -> impl Strategy<Value = Append> {
    prop_oneof![
        any::<u8>().prop_map(Append::U8),
        any::<i16>().prop_map(Append::I16),
        any::<i32>().prop_map(Append::I32),
        any::<f32>().prop_map(Append::F32),
        "[a-z0-9]{0,40}".prop_map(Append::Str),
        payload_strategy(40).prop_map(Append::Bytes),
    ]
}

proptest! {
    /// Any command id and any payload up to the maximum survives encode/decode.
    #[test]
    fn prop_frame_roundtrip(cmd in any::<u8>(), payload in payload_strategy(MAX_PAYLOAD)) {
        let frame = encode_frame(cmd, &payload).unwrap();
        prop_assert_eq!(frame.len(), 6 + payload.len());
        prop_assert_eq!(frame[0], START_BYTE);

        let decoded = decode_frame(&frame).unwrap();
        prop_assert_eq!(decoded.command_id, cmd);
        prop_assert_eq!(decoded.payload.to_vec(), payload);
    }

    /// Payloads above the maximum are refused.
    #[test]
    fn prop_oversized_payload_rejected(extra in 1usize..64) {
        let payload = vec![0u8; MAX_PAYLOAD + extra];
        let result = encode_frame(0x55u8, &payload);
        prop_assert_eq!(
            result,
            Err(FrameError::PayloadTooLarge { size: MAX_PAYLOAD + extra, max: MAX_PAYLOAD })
        );
    }

    /// A single flipped bit in the start byte, command, payload or CRC is
    /// always detected.
    #[test]
    fn prop_single_bit_flip_rejected(
        cmd in any::<u8>(),
        payload in payload_strategy(64),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut frame = encode_frame(cmd, &payload).unwrap();
        let candidates: Vec<usize> = (0..frame.len()).filter(|i| *i != 2 && *i != 3).collect();
        let target = candidates[index.index(candidates.len())];

        frame[target] ^= 1 << bit;
        prop_assert!(decode_frame(&frame).is_err());
    }

    /// Raising the declared length past the bytes present is detected.
    #[test]
    fn prop_length_increase_rejected(
        payload in payload_strategy(64),
        bit in 0u8..16,
    ) {
        let mut frame = encode_frame(0x54u8, &payload).unwrap();
        let declared = u16::from_be_bytes([frame[2], frame[3]]);
        let flipped = declared ^ (1 << bit);
        prop_assume!(flipped > declared);

        frame[2..4].copy_from_slice(&flipped.to_be_bytes());
        prop_assert!(decode_frame(&frame).is_err());
    }

    /// Every strict prefix of a frame is rejected.
    #[test]
    fn prop_truncated_prefix_rejected(
        cmd in any::<u8>(),
        payload in payload_strategy(128),
        cut in any::<prop::sample::Index>(),
    ) {
        let frame = encode_frame(cmd, &payload).unwrap();
        let len = cut.index(frame.len());
        prop_assert!(decode_frame(&frame[..len]).is_err());
    }

    /// A failed append leaves the builder exactly as it was.
    #[test]
    fn prop_builder_overflow_is_atomic(
        limit in 0usize..64,
        ops in prop::collection::vec(append_strategy(), 0..32),
    ) {
        let mut builder = PayloadBuilder::with_capacity_limit(limit);

        for op in ops {
            let before = builder.finalize();
            if op.apply(&mut builder).is_err() {
                prop_assert_eq!(builder.finalize(), before);
            }
            prop_assert!(builder.len() <= limit);
        }
    }

    /// Strings up to 255 bytes round-trip through the payload codec.
    #[test]
    fn prop_string_roundtrip(text in "[ -~]{0,255}", tail in any::<u8>()) {
        let mut builder = PayloadBuilder::new();
        builder.add_string(&text).unwrap();
        builder.add_u8(tail).unwrap();
        let bytes = builder.finalize();
        prop_assert_eq!(bytes[0] as usize, text.len());

        let mut parser = PayloadParser::new(&bytes);
        prop_assert_eq!(parser.read_string().unwrap(), text);
        prop_assert_eq!(parser.read_u8().unwrap(), tail);
        prop_assert!(!parser.has_data());
    }

    /// Multi-byte UTF-8 text comes back exactly as written.
    #[test]
    fn prop_utf8_string_roundtrip(text in "\\PC{0,63}") {
        let mut builder = PayloadBuilder::new();
        builder.add_string(&text).unwrap();
        let bytes = builder.finalize();
        prop_assert_eq!(bytes[0] as usize, text.len());

        let mut parser = PayloadParser::new(&bytes);
        prop_assert_eq!(parser.read_string().unwrap(), text);
        prop_assert!(!parser.has_data());
    }

    /// Strings longer than 255 bytes are refused, never truncated.
    #[test]
    fn prop_long_string_rejected(text in "[a-z]{256,400}") {
        let mut builder = PayloadBuilder::new();
        prop_assert_eq!(
            builder.add_string(&text),
            Err(PayloadError::StringTooLong { len: text.len() })
        );
        prop_assert!(builder.is_empty());
        prop_assert!(text.len() > MAX_STRING_LEN);
    }

    /// Reading past the end fails without moving the cursor.
    #[test]
    fn prop_parser_short_read_keeps_position(data in payload_strategy(3)) {
        let mut parser = PayloadParser::new(&data);
        prop_assert!(parser.read_i32().is_err());
        prop_assert_eq!(parser.position(), 0);
        prop_assert_eq!(parser.remaining(), data.len());
    }

    /// The streaming receiver recovers every frame from a stream with noise
    /// between frames, including stray start markers, once idle bytes are
    /// expired.
    #[test]
    fn prop_receiver_extracts_all_frames(
        frames in prop::collection::vec(
            (any::<u8>(), payload_strategy(32), payload_strategy(8), any::<bool>()),
            1..8,
        ),
    ) {
        let mut stream = Vec::new();
        for (cmd, payload, noise, stray_start) in &frames {
            if *stray_start {
                stream.push(START_BYTE);
            }
            stream.extend_from_slice(noise);
            stream.extend_from_slice(&encode_frame(*cmd, payload).unwrap());
        }

        let mut rx = FrameReceiver::new();
        let mut received = rx.feed_all(&stream);
        received.extend(rx.expire());

        prop_assert_eq!(received.len(), frames.len());
        for (frame, (cmd, payload, _, _)) in received.iter().zip(&frames) {
            prop_assert_eq!(frame.command_id, *cmd);
            prop_assert_eq!(&frame.payload.to_vec(), payload);
        }
        prop_assert!(!rx.in_frame());
    }
}
