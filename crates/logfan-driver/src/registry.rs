use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use logfan_record::{ContainerInfo, InstanceInfo};
use tracing::debug;

use crate::consume;
use crate::error::{Result, SessionError};
use crate::options::SessionOptions;
use crate::readback;
use crate::session::{PipeStream, Session};
use crate::sink::{DropCounter, DurableSink, ReadConfig, RemoteSink};

/// Concurrency-safe lookup of sessions by stream handle and by producer
/// identity.
///
/// The only structure mutated by more than one thread. The lock is held
/// for the duration of a map operation, never across blocking I/O.
pub struct Registry {
    inner: Mutex<Maps>,
    drop_counter: Arc<DropCounter>,
}

#[derive(Default)]
struct Maps {
    by_stream: HashMap<String, Arc<Session>>,
    by_producer: HashMap<String, Arc<Session>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Maps::default()),
            drop_counter: Arc::new(DropCounter::new()),
        }
    }

    /// Shared overflow counter for remote sinks to report drops into.
    pub fn drop_counter(&self) -> Arc<DropCounter> {
        Arc::clone(&self.drop_counter)
    }

    /// Register a session and spawn its consume loop.
    ///
    /// The sinks were constructed by the registration boundary; a failure
    /// there is fatal to this session only and never reaches the registry.
    /// On success the session is reachable under both keys until teardown.
    #[allow(clippy::too_many_arguments)]
    pub fn start_session(
        self: &Arc<Self>,
        stream_key: String,
        pipe: PipeStream,
        container: ContainerInfo,
        instance: Option<InstanceInfo>,
        opts: &HashMap<String, String>,
        durable: Box<dyn DurableSink>,
        remote: Box<dyn RemoteSink>,
    ) -> Result<()> {
        let options = SessionOptions::from_map(opts)?;
        let shutdown_handle = pipe.try_clone()?;

        let session = Arc::new(Session::new(
            stream_key.clone(),
            container,
            instance,
            options,
            durable,
            remote,
            shutdown_handle,
        ));

        {
            let mut maps = self.inner.lock().expect("registry lock poisoned");
            if maps.by_stream.contains_key(&stream_key) {
                return Err(SessionError::AlreadyRegistered(stream_key));
            }
            maps.by_stream.insert(stream_key, Arc::clone(&session));
            maps.by_producer
                .insert(session.producer_id().to_string(), Arc::clone(&session));
        }

        let registry = Arc::clone(self);
        let thread_session = Arc::clone(&session);
        let spawned = std::thread::Builder::new()
            .name(format!("logfan-consume-{}", session.producer_id()))
            .spawn(move || consume::run(registry, thread_session, pipe));
        if let Err(err) = spawned {
            self.remove(&session);
            session.close();
            return Err(SessionError::Stream(err));
        }

        debug!(id = %session.producer_id(), "session started");
        Ok(())
    }

    /// Stop a session by its stream handle.
    ///
    /// Removal under both keys happens atomically under the lock; the
    /// blocking teardown (flush, stream shutdown, sink closes) runs after
    /// the lock is released. Unblocking the stream makes the consume
    /// loop's pending read return promptly.
    pub fn stop_session(&self, stream_key: &str) -> Result<()> {
        debug!(stream = stream_key, "stopping logging");
        let session = {
            let mut maps = self.inner.lock().expect("registry lock poisoned");
            let session = maps
                .by_stream
                .remove(stream_key)
                .ok_or_else(|| SessionError::UnknownStream(stream_key.to_string()))?;
            maps.by_producer.remove(session.producer_id());
            session
        };
        session.close();
        Ok(())
    }

    /// Remove a session that tore itself down (consume loop exit).
    pub(crate) fn remove(&self, session: &Arc<Session>) {
        let mut maps = self.inner.lock().expect("registry lock poisoned");
        if maps
            .by_stream
            .get(session.stream_key())
            .is_some_and(|existing| Arc::ptr_eq(existing, session))
        {
            maps.by_stream.remove(session.stream_key());
        }
        if maps
            .by_producer
            .get(session.producer_id())
            .is_some_and(|existing| Arc::ptr_eq(existing, session))
        {
            maps.by_producer.remove(session.producer_id());
        }
    }

    pub fn get_by_stream(&self, stream_key: &str) -> Option<Arc<Session>> {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .by_stream
            .get(stream_key)
            .cloned()
    }

    pub fn get_by_producer(&self, producer_id: &str) -> Option<Arc<Session>> {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .by_producer
            .get(producer_id)
            .cloned()
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .by_stream
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a read-back stream for a producer.
    ///
    /// Returns the consumer end of a byte stream carrying the producer's
    /// stored records re-framed in the wire format. Each call is an
    /// independent subscription; concurrent readers do not share state.
    pub fn read_logs(
        &self,
        producer_id: &str,
        config: ReadConfig,
    ) -> Result<std::os::unix::net::UnixStream> {
        let session = self
            .get_by_producer(producer_id)
            .ok_or_else(|| SessionError::UnknownProducer(producer_id.to_string()))?;
        let subscription = session.durable.subscribe(config);
        readback::spawn_pump(subscription, producer_id).map_err(SessionError::Stream)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
