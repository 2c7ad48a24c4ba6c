use std::collections::HashMap;
use std::time::Duration;

use logfan_enrich::EnrichConfig;
use logfan_record::Severity;

use crate::error::{Result, SessionError};

pub const EXTRACT_JSON_MESSAGE: &str = "extract-json-message";
pub const EXTRACT_SEVERITY: &str = "extract-severity";
pub const EXCLUDE_TIMESTAMP: &str = "exclude-timestamp";
pub const EXTRACT_MSG: &str = "extract-msg";
pub const EXTRACT_GCP: &str = "extract-gcp";
pub const EXTRACT_CADDY: &str = "extract-caddy";
pub const INTERNAL_ERROR_SEVERITY: &str = "internal-error-severity";
pub const SLEEP_INTERVAL: &str = "sleep-interval";
pub const LOCAL_LOGGING: &str = "local-logging";

/// Options accepted but consumed by the external sink constructors, not by
/// the pipeline itself.
pub const PASSTHROUGH_KEYS: [&str; 11] = [
    "gcp-project",
    "labels",
    "labels-regex",
    "env",
    "env-regex",
    "gcp-log-cmd",
    "gcp-meta-zone",
    "gcp-meta-name",
    "gcp-meta-id",
    "credentials-file",
    "credentials-json",
];

const DEFAULT_SLEEP_INTERVAL: Duration = Duration::from_millis(500);

/// Per-session settings parsed from the registration boundary's opaque
/// string-keyed option map. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub enrich: EnrichConfig,
    /// Back-off used when the producer sends a blank heartbeat line.
    pub sleep_interval: Duration,
    /// When false, the durable sink receives no writes (read-back still
    /// works against whatever it already holds).
    pub local_logging: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            enrich: EnrichConfig::default(),
            sleep_interval: DEFAULT_SLEEP_INTERVAL,
            local_logging: false,
        }
    }
}

impl SessionOptions {
    /// Parse and validate an option map against the fixed allow-list.
    pub fn from_map(opts: &HashMap<String, String>) -> Result<Self> {
        let mut options = SessionOptions::default();

        for (key, value) in opts {
            match key.as_str() {
                EXTRACT_JSON_MESSAGE => {
                    options.enrich.extract_json_message = parse_bool(key, value)?
                }
                EXTRACT_SEVERITY => options.enrich.extract_severity = parse_bool(key, value)?,
                EXCLUDE_TIMESTAMP => options.enrich.exclude_timestamp = parse_bool(key, value)?,
                EXTRACT_MSG => options.enrich.extract_msg = parse_bool(key, value)?,
                EXTRACT_GCP => options.enrich.extract_gcp = parse_bool(key, value)?,
                EXTRACT_CADDY => options.enrich.extract_caddy = parse_bool(key, value)?,
                INTERNAL_ERROR_SEVERITY => {
                    options.enrich.internal_error_severity = parse_severity(key, value)?
                }
                SLEEP_INTERVAL => {
                    // 0 falls back to the default rather than busy-polling.
                    let millis = parse_millis(key, value)?;
                    if millis > 0 {
                        options.sleep_interval = Duration::from_millis(millis);
                    }
                }
                LOCAL_LOGGING => options.local_logging = parse_bool(key, value)?,
                other if PASSTHROUGH_KEYS.contains(&other) => {}
                _ => {
                    return Err(SessionError::UnknownOption {
                        key: key.clone(),
                    })
                }
            }
        }

        Ok(options)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| SessionError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected \"true\" or \"false\"".to_string(),
    })
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| SessionError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected milliseconds as a non-negative integer".to_string(),
    })
}

fn parse_severity(key: &str, value: &str) -> Result<Severity> {
    let severity = Severity::parse(value);
    if severity == Severity::Default && !value.trim().eq_ignore_ascii_case("default") {
        return Err(SessionError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: "unrecognized severity name".to_string(),
        });
    }
    Ok(severity)
}
