use serde::{Deserialize, Serialize};

/// Metadata attached to one fragment of a chunked record.
///
/// A producer that splits an oversized line across several frames tags every
/// fragment with the same `id`, an increasing `ordinal`, and `last` set on
/// the terminal fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMeta {
    pub id: String,
    pub last: bool,
    pub ordinal: i32,
}

/// One unit of the wire protocol.
///
/// Decoded from a length-delimited frame, enriched in place, and discarded
/// after dispatch. An empty (or whitespace-only) `line` is a heartbeat, not
/// a log, and never reaches a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Raw line bytes. Arbitrary bytes are preserved exactly across a
    /// wire round-trip.
    pub line: Vec<u8>,
    /// Origin tag, e.g. "stdout" or "stderr".
    pub source: String,
    /// Nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
    /// True when this record is one fragment of a chunked line.
    #[serde(default)]
    pub partial: bool,
    /// Present iff `partial` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_metadata: Option<PartialMeta>,
}

impl LogRecord {
    /// Create a non-partial record.
    pub fn new(line: impl Into<Vec<u8>>, source: impl Into<String>, timestamp_nanos: i64) -> Self {
        Self {
            line: line.into(),
            source: source.into(),
            timestamp_nanos,
            partial: false,
            partial_metadata: None,
        }
    }

    /// True when the line contains no non-whitespace bytes.
    ///
    /// Blank lines act as heartbeats: the consume loop backs off instead of
    /// dispatching them.
    pub fn is_blank(&self) -> bool {
        self.line.iter().all(|b| b.is_ascii_whitespace())
    }

    /// True when the line is syntactically a JSON object (starts with `{`
    /// and ends with `}`). Only such lines are candidates for enrichment.
    pub fn looks_like_json_object(&self) -> bool {
        matches!(
            (self.line.first(), self.line.last()),
            (Some(b'{'), Some(b'}'))
        )
    }
}
