//! Record model and sink entry types for the logfan pipeline.
//!
//! This is the leaf crate everything else builds on: the wire-level
//! [`LogRecord`], the [`Severity`] ladder with its parsing rules, the
//! [`DriverError`] diagnostic type with its first-wins [`ErrorSlot`], and
//! the enriched [`SinkEntry`] handed to sinks.

pub mod context;
pub mod entry;
pub mod error;
pub mod record;
pub mod severity;

pub use context::{ContainerInfo, InstanceInfo};
pub use entry::{timestamp_from_nanos, HttpRequest, Payload, SinkEntry, SourceLocation};
pub use error::{DriverError, ErrorSlot};
pub use record::{LogRecord, PartialMeta};
pub use severity::Severity;
