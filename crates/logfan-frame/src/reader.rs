use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use logfan_record::LogRecord;

use crate::codec::{decode_record, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete records from any `Read` stream.
///
/// Handles partial reads internally — callers always get whole records. A
/// short frame waits for more bytes instead of erroring.
///
/// After a non-terminal decode error the consume loop re-creates the reader
/// on the same stream via [`FrameReader::into_inner`]. Buffered bytes are
/// discarded in that case; recovery is lossy and does not guarantee
/// realignment with the next frame boundary.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete record (blocking).
    ///
    /// Returns `Err(FrameError::StreamClosed)` when EOF is reached.
    pub fn read_record(&mut self) -> Result<LogRecord> {
        loop {
            if let Some(record) = decode_record(&mut self.buf, self.config.max_payload_size)? {
                return Ok(record);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::StreamClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream, dropping any
    /// buffered bytes.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
