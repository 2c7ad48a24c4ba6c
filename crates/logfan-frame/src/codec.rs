use bytes::{Buf, BufMut, Bytes, BytesMut};
use logfan_record::LogRecord;

use crate::error::{FrameError, Result};

/// Frame header: a 4-byte big-endian payload length.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Maximum frame payload: 1,000,000 bytes.
///
/// Bounds memory use against a misbehaving producer; a frame declaring more
/// than this is rejected before any payload bytes are buffered.
pub const MAX_FRAME_PAYLOAD: usize = 1_000_000;

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: [`MAX_FRAME_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_FRAME_PAYLOAD,
        }
    }
}

/// Encode a record into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────────┬─────────────────────────┐
/// │ Length (4B BE)│ Serialized record        │
/// │               │ (Length bytes)           │
/// └───────────────┴─────────────────────────┘
/// ```
pub fn encode_frame(record: &LogRecord, dst: &mut BytesMut, max_payload: usize) -> Result<()> {
    let body = serde_json::to_vec(record)?;
    if body.len() > max_payload {
        return Err(FrameError::FrameTooLarge {
            size: body.len(),
            max: max_payload,
        });
    }
    dst.reserve(LEN_PREFIX_SIZE + body.len());
    dst.put_u32(body.len() as u32);
    dst.put_slice(&body);
    Ok(())
}

/// Decode one frame's payload bytes from a buffer.
///
/// Returns `Ok(None)` if the buffer does not yet contain a complete frame.
/// On success, consumes the frame bytes from the buffer. The oversize check
/// runs on the declared length, before the payload has arrived.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < LEN_PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let payload_len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

    if payload_len > max_payload {
        return Err(FrameError::FrameTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = LEN_PREFIX_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(LEN_PREFIX_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Decode one frame and deserialize its record.
pub fn decode_record(src: &mut BytesMut, max_payload: usize) -> Result<Option<LogRecord>> {
    match decode_frame(src, max_payload)? {
        Some(payload) => Ok(Some(serde_json::from_slice(&payload)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogRecord {
        LogRecord::new(r#"{"msg":"hello"}"#, "stdout", 1_700_000_000_000_000_000)
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut buf = BytesMut::new();
        let record = sample();

        encode_frame(&record, &mut buf, MAX_FRAME_PAYLOAD).unwrap();
        let decoded = decode_record(&mut buf, MAX_FRAME_PAYLOAD).unwrap().unwrap();

        assert_eq!(decoded, record);
        assert!(buf.is_empty());
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let mut buf = BytesMut::new();
        encode_frame(&sample(), &mut buf, MAX_FRAME_PAYLOAD).unwrap();

        let declared = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
        assert_eq!(declared, buf.len() - LEN_PREFIX_SIZE);
    }

    #[test]
    fn incomplete_prefix_needs_more_data() {
        let mut buf = BytesMut::from(&[0x00, 0x00][..]);
        assert!(decode_frame(&mut buf, MAX_FRAME_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn incomplete_payload_needs_more_data() {
        let mut buf = BytesMut::new();
        encode_frame(&sample(), &mut buf, MAX_FRAME_PAYLOAD).unwrap();
        buf.truncate(LEN_PREFIX_SIZE + 3);

        assert!(decode_frame(&mut buf, MAX_FRAME_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn oversize_declaration_rejected_without_payload() {
        let mut buf = BytesMut::new();
        buf.put_u32((MAX_FRAME_PAYLOAD + 1) as u32);

        let err = decode_frame(&mut buf, MAX_FRAME_PAYLOAD).unwrap_err();
        assert!(matches!(
            err,
            FrameError::FrameTooLarge {
                size,
                max: MAX_FRAME_PAYLOAD
            } if size == MAX_FRAME_PAYLOAD + 1
        ));
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let mut buf = BytesMut::new();
        buf.put_u32(4);
        buf.put_slice(b"\xff\xfe\x00!");

        let err = decode_record(&mut buf, MAX_FRAME_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn multiple_frames_decode_in_order() {
        let mut buf = BytesMut::new();
        let first = LogRecord::new("one", "stdout", 1);
        let second = LogRecord::new("two", "stderr", 2);
        encode_frame(&first, &mut buf, MAX_FRAME_PAYLOAD).unwrap();
        encode_frame(&second, &mut buf, MAX_FRAME_PAYLOAD).unwrap();

        assert_eq!(
            decode_record(&mut buf, MAX_FRAME_PAYLOAD).unwrap().unwrap(),
            first
        );
        assert_eq!(
            decode_record(&mut buf, MAX_FRAME_PAYLOAD).unwrap().unwrap(),
            second
        );
        assert!(buf.is_empty());
    }
}
