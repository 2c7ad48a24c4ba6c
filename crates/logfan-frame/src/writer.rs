use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use logfan_record::LogRecord;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete record frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Serialize and send one record as a length-delimited frame (blocking).
    pub fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        self.buf.clear();
        encode_frame(record, &mut self.buf, self.config.max_payload_size)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::StreamClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_record, MAX_FRAME_PAYLOAD};
    use crate::reader::FrameReader;

    #[test]
    fn written_frame_decodes() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let record = LogRecord::new("hello", "stdout", 1);

        writer.write_record(&record).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let decoded = decode_record(&mut wire, MAX_FRAME_PAYLOAD).unwrap().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn oversize_record_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 32,
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);
        let record = LogRecord::new(vec![b'x'; 64], "stdout", 0);

        let err = writer.write_record(&record).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
    }

    #[test]
    fn zero_length_write_is_stream_closed() {
        struct ZeroWriter;
        impl Write for ZeroWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer
            .write_record(&LogRecord::new("x", "stdout", 0))
            .unwrap_err();
        assert!(matches!(err, FrameError::StreamClosed));
    }

    #[test]
    fn interrupted_write_retries() {
        struct InterruptedOnce {
            tripped: bool,
            data: Vec<u8>,
        }
        impl Write for InterruptedOnce {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.tripped {
                    self.tripped = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(InterruptedOnce {
            tripped: false,
            data: Vec::new(),
        });
        writer
            .write_record(&LogRecord::new("retry", "stdout", 0))
            .unwrap();
        assert!(!writer.get_ref().data.is_empty());
    }

    #[test]
    fn writer_reader_round_trip() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let records = vec![
            LogRecord::new("a", "stdout", 1),
            LogRecord::new("b", "stderr", 2),
        ];
        for record in &records {
            writer.write_record(record).unwrap();
        }

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));
        for expected in &records {
            assert_eq!(&reader.read_record().unwrap(), expected);
        }
    }
}
