use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use logfan_record::{LogRecord, SinkEntry};
use serde::{Deserialize, Serialize};

/// Errors a sink can report back to the pipeline.
///
/// All of them are non-fatal to the consume loop; the pipeline converts
/// each into a log line or a counter increment and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink shed this record under sustained load.
    #[error("sink overflow, record dropped")]
    Overflow,

    /// The sink has already been closed.
    #[error("sink closed")]
    Closed,

    /// An I/O error inside the sink.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other sink-specific failure.
    #[error("{0}")]
    Other(String),
}

impl SinkError {
    /// Classify overflow separately: it is aggregated, not logged per record.
    pub fn is_overflow(&self) -> bool {
        matches!(self, SinkError::Overflow)
    }
}

/// The remote structured-logging destination.
///
/// The pipeline depends only on this capability surface, never on a
/// concrete client. Implementations buffer internally and may shed records
/// under sustained overload, reporting each shed via a [`DropCounter`].
pub trait RemoteSink: Send + Sync {
    fn write(&self, entry: SinkEntry) -> Result<(), SinkError>;
    /// Bound data loss on shutdown; issued before `close`.
    fn flush(&self) -> Result<(), SinkError>;
    fn close(&self) -> Result<(), SinkError>;
}

/// The durable local destination, with a live/historical read interface.
pub trait DurableSink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
    fn close(&self) -> Result<(), SinkError>;
    /// Subscribe to stored records. The subscription delivers records in
    /// storage order and signals end-of-data by closing its channel.
    fn subscribe(&self, config: ReadConfig) -> Subscription;
}

/// What a read-back request wants from the durable sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Keep the subscription open and stream new records as they arrive.
    pub follow: bool,
    /// Only the last N stored records.
    pub tail: Option<usize>,
    /// Only records at or after this wire timestamp.
    pub since_nanos: Option<i64>,
}

/// Consumer half of a durable-sink subscription.
///
/// Records and errors arrive on separate channels; end-of-data is the
/// record channel closing with no error queued. `cancel` is the
/// reverse-pressure signal: the consumer is gone, stop producing.
pub struct Subscription {
    pub records: Receiver<LogRecord>,
    pub errors: Receiver<SinkError>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    /// Tell the producing side to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Producer half of a durable-sink subscription, held by the sink.
pub struct SubscriptionSender {
    pub records: Sender<LogRecord>,
    pub errors: Sender<SinkError>,
    cancelled: Arc<AtomicBool>,
}

impl SubscriptionSender {
    /// True once the consumer has gone away; the sink should stop sending.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Create a linked subscription pair.
pub fn subscription_channel() -> (SubscriptionSender, Subscription) {
    let (record_tx, record_rx) = std::sync::mpsc::channel();
    let (error_tx, error_rx) = std::sync::mpsc::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    (
        SubscriptionSender {
            records: record_tx,
            errors: error_tx,
            cancelled: Arc::clone(&cancelled),
        },
        Subscription {
            records: record_rx,
            errors: error_rx,
            cancelled,
        },
    )
}

/// Cadence for overflow logging: the first drop, then every 1000th.
const DROP_LOG_INTERVAL: u64 = 1000;

/// Aggregates remote-sink overflow so a flood of drops cannot amplify
/// itself into a flood of error logs.
#[derive(Debug, Default)]
pub struct DropCounter {
    dropped: AtomicU64,
}

impl DropCounter {
    pub const fn new() -> Self {
        Self {
            dropped: AtomicU64::new(0),
        }
    }

    /// Route one sink error: overflow increments the counter and logs on
    /// the cadence; anything else is logged immediately.
    pub fn note(&self, err: &SinkError) {
        if err.is_overflow() {
            let count = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if Self::should_log(count) {
                tracing::error!(dropped = count, "remote sink has dropped {count} records");
            }
        } else {
            tracing::error!(error = %err, "remote sink error");
        }
    }

    /// Total records shed so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn should_log(count: u64) -> bool {
        count % DROP_LOG_INTERVAL == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_classification() {
        assert!(SinkError::Overflow.is_overflow());
        assert!(!SinkError::Closed.is_overflow());
        assert!(!SinkError::Other("x".into()).is_overflow());
    }

    #[test]
    fn drop_counter_counts_only_overflow() {
        let counter = DropCounter::new();
        counter.note(&SinkError::Overflow);
        counter.note(&SinkError::Other("net down".into()));
        counter.note(&SinkError::Overflow);

        assert_eq!(counter.dropped(), 2);
    }

    #[test]
    fn log_cadence_is_first_then_every_thousandth() {
        assert!(DropCounter::should_log(1));
        assert!(!DropCounter::should_log(2));
        assert!(!DropCounter::should_log(1000));
        assert!(DropCounter::should_log(1001));
        assert!(DropCounter::should_log(2001));
    }

    #[test]
    fn subscription_cancel_is_visible_to_sender() {
        let (sender, subscription) = subscription_channel();
        assert!(!sender.is_cancelled());

        subscription.cancel();
        assert!(sender.is_cancelled());
        subscription.cancel(); // idempotent
        assert!(sender.is_cancelled());
    }

    #[test]
    fn subscription_delivers_in_order() {
        let (sender, subscription) = subscription_channel();
        for i in 0..3 {
            sender
                .records
                .send(LogRecord::new(format!("r{i}"), "stdout", i))
                .unwrap();
        }
        drop(sender);

        let got: Vec<_> = subscription.records.iter().map(|r| r.line).collect();
        assert_eq!(got, vec![b"r0".to_vec(), b"r1".to_vec(), b"r2".to_vec()]);
    }
}
