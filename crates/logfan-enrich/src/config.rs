use logfan_record::Severity;

/// Per-session enrichment flags, fixed at session creation.
///
/// Each flag independently gates one step of the enrichment pass. Nothing
/// here is mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    /// Parse `{...}` lines as JSON and enrich the resulting object. When a
    /// line is not a JSON object it is wrapped verbatim in a plain envelope
    /// and no other step runs.
    pub extract_json_message: bool,
    /// Scan `severity`, then `level`, for the entry severity.
    pub extract_severity: bool,
    /// Delete `timestamp`/`time`/`ts` keys from the payload. The wire-level
    /// timestamp stays authoritative either way.
    pub exclude_timestamp: bool,
    /// Rename a `msg` key to `message`.
    pub extract_msg: bool,
    /// Lift the reserved `logging.googleapis.com/*` keys into the entry's
    /// structured fields.
    pub extract_gcp: bool,
    /// Build a structured HTTP request description from an access-log style
    /// payload (Caddy convention).
    pub extract_caddy: bool,
    /// Severity forced onto entries carrying an internal pipeline error.
    pub internal_error_severity: Severity,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            extract_json_message: true,
            extract_severity: true,
            exclude_timestamp: false,
            extract_msg: true,
            extract_gcp: false,
            extract_caddy: false,
            internal_error_severity: Severity::Error,
        }
    }
}
