use std::time::SystemTime;

/// A pipeline diagnostic: what went wrong, where, and when.
///
/// `origin` is a coarse code-location tag (module or operation name), not a
/// backtrace. The creation timestamp is kept so an error overlaid onto a
/// later sink entry still carries the time it actually occurred.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{origin} - {msg}")]
pub struct DriverError {
    pub msg: String,
    pub origin: &'static str,
    pub at: SystemTime,
}

impl DriverError {
    /// Create a diagnostic stamped with the current time.
    pub fn new(origin: &'static str, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            origin,
            at: SystemTime::now(),
        }
    }
}

/// A first-wins error box.
///
/// Accumulates at most one [`DriverError`] per enrichment pass: the first
/// `set` wins and later calls are no-ops, so the earliest (most relevant)
/// diagnostic survives. Bounded to a single record's processing.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    inner: Option<DriverError>,
}

impl ErrorSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless one is already held.
    pub fn set(&mut self, err: DriverError) {
        if self.inner.is_none() {
            self.inner = Some(err);
        }
    }

    /// The captured error, if any.
    pub fn get(&self) -> Option<&DriverError> {
        self.inner.as_ref()
    }

    /// Remove and return the captured error.
    pub fn take(&mut self) -> Option<DriverError> {
        self.inner.take()
    }
}
