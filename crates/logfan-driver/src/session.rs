use std::io::Read;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU8, Ordering};

use logfan_record::{ContainerInfo, InstanceInfo};
use tracing::warn;

use crate::options::SessionOptions;
use crate::sink::{DurableSink, RemoteSink};

/// A producer's byte stream.
///
/// Wraps the connected stream the host hands us at registration. `try_clone`
/// yields a second handle onto the same stream so a session can shut the
/// stream down from another thread, unblocking a consume loop parked in a
/// blocking read.
pub struct PipeStream {
    inner: UnixStream,
}

impl PipeStream {
    pub fn from_unix(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// A connected pair: the read end for a session, the write end for the
    /// producer (or a test).
    pub fn pair() -> std::io::Result<(PipeStream, UnixStream)> {
        let (producer, consumer) = UnixStream::pair()?;
        Ok((Self::from_unix(consumer), producer))
    }

    /// Duplicate the handle (new file descriptor, same stream).
    pub fn try_clone(&self) -> std::io::Result<PipeStream> {
        Ok(Self::from_unix(self.inner.try_clone()?))
    }

    /// Close both directions, unblocking any pending read on any handle to
    /// this stream.
    pub fn shutdown(&self) -> std::io::Result<()> {
        self.inner.shutdown(std::net::Shutdown::Both)
    }
}

impl Read for PipeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for PipeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeStream").finish_non_exhaustive()
    }
}

/// Lifecycle of a session's consume loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionState {
    /// Registered, consume thread not yet running.
    Open = 0,
    /// Consume loop is decoding frames.
    Consuming = 1,
    /// Teardown claimed; stream and sinks being released.
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(raw: u8) -> SessionState {
        match raw {
            0 => SessionState::Open,
            1 => SessionState::Consuming,
            2 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }
}

/// The pipeline state for one active producer.
///
/// Owns exactly one durable sink and one remote sink, opened at session
/// start and closed together at session end. Reachable in the registry by
/// both its stream key and its producer identity for its whole lifetime.
pub struct Session {
    stream_key: String,
    container: ContainerInfo,
    instance: Option<InstanceInfo>,
    pub(crate) options: SessionOptions,
    pub(crate) durable: Box<dyn DurableSink>,
    pub(crate) remote: Box<dyn RemoteSink>,
    /// Duplicate handle used only to shut the stream down at close.
    shutdown_handle: PipeStream,
    state: AtomicU8,
}

impl Session {
    pub(crate) fn new(
        stream_key: String,
        container: ContainerInfo,
        instance: Option<InstanceInfo>,
        options: SessionOptions,
        durable: Box<dyn DurableSink>,
        remote: Box<dyn RemoteSink>,
        shutdown_handle: PipeStream,
    ) -> Self {
        Self {
            stream_key,
            container,
            instance,
            options,
            durable,
            remote,
            shutdown_handle,
            state: AtomicU8::new(SessionState::Open as u8),
        }
    }

    /// The stream handle this session consumes from.
    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    /// Stable identity of the emitting producer.
    pub fn producer_id(&self) -> &str {
        &self.container.id
    }

    pub fn container(&self) -> &ContainerInfo {
        &self.container
    }

    pub fn instance(&self) -> Option<&InstanceInfo> {
        self.instance.as_ref()
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_consuming(&self) {
        // Only advances Open -> Consuming; a close that raced ahead wins.
        let _ = self.state.compare_exchange(
            SessionState::Open as u8,
            SessionState::Consuming as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Release the stream and both sinks.
    ///
    /// Safe to race between an external stop request and the consume loop's
    /// own termination: the first caller claims the transition to
    /// `Closing`, every later call is a no-op. The remote sink is flushed
    /// before close to bound data loss.
    pub fn close(&self) {
        if !self.begin_close() {
            return;
        }

        if let Err(err) = self.remote.flush() {
            warn!(id = %self.producer_id(), error = %err, "error flushing remote sink during shutdown");
        }
        if let Err(err) = self.shutdown_handle.shutdown() {
            // Already gone when the consume loop exited on its own.
            tracing::debug!(id = %self.producer_id(), error = %err, "stream already shut down");
        }
        if let Err(err) = self.remote.close() {
            warn!(id = %self.producer_id(), error = %err, "error closing remote sink");
        }
        if let Err(err) = self.durable.close() {
            warn!(id = %self.producer_id(), error = %err, "error closing durable sink");
        }

        self.state
            .store(SessionState::Closed as u8, Ordering::SeqCst);
    }

    /// Claim the close transition. Returns false if teardown already ran.
    fn begin_close(&self) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                if state < SessionState::Closing as u8 {
                    Some(SessionState::Closing as u8)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("stream_key", &self.stream_key)
            .field("producer_id", &self.producer_id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
