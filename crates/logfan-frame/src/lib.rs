//! Length-delimited record framing for the log pipeline.
//!
//! Every record travels as a 4-byte big-endian length prefix followed by
//! that many bytes of serialized record. The same format is used on both
//! the ingestion path and the read-back path.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, LEN_PREFIX_SIZE, MAX_FRAME_PAYLOAD};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
