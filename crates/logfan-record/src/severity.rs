use serde::{Deserialize, Serialize};

/// Severity of an outgoing sink entry.
///
/// Mirrors the structured-logging severity ladder used by the remote sink.
/// `Default` means "no severity was extracted"; sinks treat it as unset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Canonical uppercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Parse a severity from a payload value.
    ///
    /// Case-insensitive. Known aliases are normalized first (`warn` →
    /// warning, `panic`/`dpanic` → critical, `fatal` → alert). If the name
    /// is not recognized the input is retried as a numeric severity code.
    /// Returns `Default` when nothing matches.
    pub fn parse(raw: &str) -> Severity {
        let lowered = raw.trim().to_ascii_lowercase();
        let name = match lowered.as_str() {
            "warn" => "warning",
            "panic" | "dpanic" => "critical",
            "fatal" => "alert",
            other => other,
        };

        match name {
            "default" => Severity::Default,
            "debug" => Severity::Debug,
            "info" => Severity::Info,
            "notice" => Severity::Notice,
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            "critical" => Severity::Critical,
            "alert" => Severity::Alert,
            "emergency" => Severity::Emergency,
            _ => match lowered.parse::<i64>() {
                Ok(code) => Severity::from_code(code),
                Err(_) => Severity::Default,
            },
        }
    }

    /// Map a numeric severity code to a level. Codes between two levels
    /// round down; codes outside the ladder clamp to its ends.
    pub fn from_code(code: i64) -> Severity {
        match code {
            i64::MIN..=99 => Severity::Default,
            100..=199 => Severity::Debug,
            200..=299 => Severity::Info,
            300..=399 => Severity::Notice,
            400..=499 => Severity::Warning,
            500..=599 => Severity::Error,
            600..=699 => Severity::Critical,
            700..=799 => Severity::Alert,
            800.. => Severity::Emergency,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
