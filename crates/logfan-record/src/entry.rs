use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::severity::Severity;

/// Source-code location lifted from a structured payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
}

/// Structured description of an HTTP request, lifted from an access-log
/// style payload. Every field degrades independently; a mistyped source
/// field simply stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Request body size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_size: Option<i64>,
    /// Response body size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default)]
    pub https: bool,
}

/// The body of a sink entry: either the mutated JSON object of a structured
/// line, or plain text for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Json(Map<String, Value>),
}

impl Payload {
    /// The JSON object form, when this payload is structured.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Json(map) => Some(map),
            Payload::Text(_) => None,
        }
    }

    /// Mutable access to the JSON object form.
    pub fn as_object_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            Payload::Json(map) => Some(map),
            Payload::Text(_) => None,
        }
    }
}

/// One enriched record on its way to a sink.
///
/// Built by the enrichment engine from a decoded [`crate::LogRecord`]; the
/// structured fields are populated by the vendor-field and HTTP-request
/// lifts and stay `None` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkEntry {
    pub timestamp: SystemTime,
    pub severity: Severity,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_sampled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request: Option<HttpRequest>,
}

impl SinkEntry {
    /// Entry with an unset severity and no structured fields.
    pub fn new(timestamp: SystemTime, payload: Payload) -> Self {
        Self {
            timestamp,
            severity: Severity::Default,
            payload,
            labels: BTreeMap::new(),
            trace: None,
            span_id: None,
            trace_sampled: None,
            source_location: None,
            http_request: None,
        }
    }
}

/// Convert a wire-level nanosecond timestamp to a [`SystemTime`].
///
/// Negative values (pre-epoch) are handled; a value the platform cannot
/// represent saturates at the epoch.
pub fn timestamp_from_nanos(nanos: i64) -> SystemTime {
    if nanos >= 0 {
        UNIX_EPOCH + Duration::from_nanos(nanos as u64)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_nanos(nanos.unsigned_abs()))
            .unwrap_or(UNIX_EPOCH)
    }
}
