use crate::sink::SinkError;

/// Errors surfaced at the session registration boundary.
///
/// Per-record failures never appear here: they are absorbed inside the
/// consume loop. Only session setup and lookup problems are fatal, and only
/// to the session they concern.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An option key outside the allow-list was supplied.
    #[error("{key:?} is not a valid option for the logfan driver")]
    UnknownOption { key: String },

    /// An option value failed to parse.
    #[error("invalid value {value:?} for option {key:?}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// A session is already registered under this stream handle.
    #[error("session already registered for stream {0:?}")]
    AlreadyRegistered(String),

    /// No session is registered under this stream handle.
    #[error("no session for stream {0:?}")]
    UnknownStream(String),

    /// No session is registered for this producer.
    #[error("no session for producer {0:?}")]
    UnknownProducer(String),

    /// Opening or duplicating the producer stream failed.
    #[error("stream setup failed: {0}")]
    Stream(#[from] std::io::Error),

    /// A sink failed during session setup or teardown.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
