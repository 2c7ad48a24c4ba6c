//! Log-record pipeline: framed ingest, payload enrichment, multi-sink
//! dispatch.
//!
//! logfan consumes length-delimited log records from per-producer byte
//! streams, enriches structured payloads (severity, timestamps, cloud
//! logging fields), and fans each record out to a durable local sink and a
//! remote structured-logging sink.
//!
//! # Crate Structure
//!
//! - [`record`] — Record model, severity ladder, sink entry types
//! - [`frame`] — Length-prefixed wire codec with lossy error recovery
//! - [`enrich`] — Payload enrichment engine
//! - [`driver`] — Sessions, registry, consume loop, read-back

/// Re-export record types.
pub mod record {
    pub use logfan_record::*;
}

/// Re-export frame codec types.
pub mod frame {
    pub use logfan_frame::*;
}

/// Re-export enrichment types.
pub mod enrich {
    pub use logfan_enrich::*;
}

/// Re-export session and dispatch types.
pub mod driver {
    pub use logfan_driver::*;
}

pub mod logging;
