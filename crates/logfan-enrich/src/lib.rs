//! Payload enrichment for the log pipeline.
//!
//! Pure rewriting of a record's JSON payload according to a per-session
//! [`EnrichConfig`]: severity and timestamp extraction, message-field
//! renaming, vendor structured-field lifting, HTTP-request lifting, and the
//! internal-error overlay.
//!
//! Enrichment never fails outward. Every partial failure degrades to one
//! captured [`logfan_record::DriverError`] (first wins), the affected
//! structured field left unset, and processing continuing.

pub mod config;
pub mod engine;

pub use config::EnrichConfig;
pub use engine::{build_entry, overlay_error, EmitContext};
