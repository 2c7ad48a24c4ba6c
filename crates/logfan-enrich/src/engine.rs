use std::time::Duration;

use logfan_record::{
    timestamp_from_nanos, ContainerInfo, DriverError, ErrorSlot, HttpRequest, InstanceInfo,
    LogRecord, Payload, Severity, SinkEntry, SourceLocation,
};
use serde_json::{Map, Value};

use crate::config::EnrichConfig;

/// Candidate payload keys holding a severity, scanned in priority order.
const SEVERITY_KEYS: [&str; 2] = ["severity", "level"];

/// Payload keys deleted by timestamp exclusion.
const TIMESTAMP_KEYS: [&str; 3] = ["timestamp", "time", "ts"];

const GCP_SOURCE_LOCATION: &str = "logging.googleapis.com/sourceLocation";
const GCP_TRACE: &str = "logging.googleapis.com/trace";
const GCP_SPAN_ID: &str = "logging.googleapis.com/spanId";
const GCP_TRACE_SAMPLED: &str = "logging.googleapis.com/trace_sampled";
const GCP_LABELS: &str = "logging.googleapis.com/labels";

/// Session-scoped context stamped into every payload.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub instance: Option<&'a InstanceInfo>,
    pub container: &'a ContainerInfo,
}

/// Run the enrichment pass over one record.
///
/// Returns the entry to dispatch plus at most one diagnostic captured along
/// the way (first one wins). This function never fails: a line that cannot
/// be parsed still produces a dispatchable entry.
pub fn build_entry(
    record: &LogRecord,
    cfg: &EnrichConfig,
    ctx: &EmitContext<'_>,
) -> (SinkEntry, Option<DriverError>) {
    let timestamp = timestamp_from_nanos(record.timestamp_nanos);
    let mut slot = ErrorSlot::new();
    let mut entry = SinkEntry::new(timestamp, Payload::Text(String::new()));

    if cfg.extract_json_message && record.looks_like_json_object() {
        match serde_json::from_slice::<Map<String, Value>>(&record.line) {
            Ok(mut map) => {
                entry.severity = extract_severity(&mut map, cfg);
                exclude_timestamp(&mut map, cfg);
                rename_msg(&mut map, cfg);
                if cfg.extract_gcp {
                    lift_gcp_fields(&mut map, &mut entry, &mut slot);
                }
                if cfg.extract_caddy {
                    lift_http_request(&map, &mut entry, &mut slot);
                }
                stamp_context(&mut map, ctx);
                entry.payload = Payload::Json(map);
            }
            Err(parse_err) => {
                tracing::debug!(error = %parse_err, "payload looked like JSON but did not parse");
                entry.payload = Payload::Text(format!(
                    "Error parsing JSON: {}",
                    String::from_utf8_lossy(&record.line)
                ));
                entry.severity = Severity::Critical;
            }
        }
    } else {
        let mut envelope = Map::new();
        stamp_context(&mut envelope, ctx);
        envelope.insert(
            "message".to_string(),
            Value::from(String::from_utf8_lossy(&record.line).into_owned()),
        );
        entry.payload = Payload::Json(envelope);
    }

    (entry, slot.take())
}

/// Replace an entry's message with an internal pipeline error.
///
/// The error came from a previous stage, not from this pass: forcing the
/// configured severity and the error's own timestamp guarantees operational
/// errors are never silently absorbed into a line that looks like ordinary
/// output.
pub fn overlay_error(entry: &mut SinkEntry, err: &DriverError, cfg: &EnrichConfig) {
    match &mut entry.payload {
        Payload::Json(map) => {
            map.remove("msg");
            map.insert("message".to_string(), Value::from(err.msg.clone()));
            map.insert("error".to_string(), Value::from(err.to_string()));
        }
        Payload::Text(text) => *text = err.to_string(),
    }
    entry.severity = cfg.internal_error_severity;
    entry.timestamp = err.at;
}

fn stamp_context(map: &mut Map<String, Value>, ctx: &EmitContext<'_>) {
    if let Some(instance) = ctx.instance {
        if let Ok(value) = serde_json::to_value(instance) {
            map.insert("instance".to_string(), value);
        }
    }
    if let Ok(value) = serde_json::to_value(ctx.container) {
        map.insert("container".to_string(), value);
    }
}

/// Scan candidate keys in priority order and parse the first string value.
///
/// The key is removed from the payload only when parsing produced a real
/// level; an unparseable value stays in the body. Non-string candidates are
/// skipped without error.
fn extract_severity(map: &mut Map<String, Value>, cfg: &EnrichConfig) -> Severity {
    if !cfg.extract_severity {
        return Severity::Default;
    }

    for key in SEVERITY_KEYS {
        let Some(value) = map.get(key) else { continue };
        if let Some(raw) = value.as_str() {
            let severity = Severity::parse(raw);
            if severity != Severity::Default {
                map.remove(key);
            }
            return severity;
        }
    }
    Severity::Default
}

fn exclude_timestamp(map: &mut Map<String, Value>, cfg: &EnrichConfig) {
    if cfg.exclude_timestamp {
        for key in TIMESTAMP_KEYS {
            map.remove(key);
        }
    }
}

fn rename_msg(map: &mut Map<String, Value>, cfg: &EnrichConfig) {
    if cfg.extract_msg {
        if let Some(msg) = map.remove("msg") {
            map.insert("message".to_string(), msg);
        }
    }
}

/// Move each reserved dotted key into the entry's structured fields.
///
/// Every lift is independently type-checked: a mismatch records one
/// diagnostic (first wins), leaves that structured field unset, and the
/// rest of the payload continues to be processed. The reserved key is
/// removed from the body either way.
fn lift_gcp_fields(map: &mut Map<String, Value>, entry: &mut SinkEntry, slot: &mut ErrorSlot) {
    if let Some(value) = map.remove(GCP_TRACE) {
        entry.trace = expect_string(GCP_TRACE, value, slot);
    }
    if let Some(value) = map.remove(GCP_SPAN_ID) {
        entry.span_id = expect_string(GCP_SPAN_ID, value, slot);
    }
    if let Some(value) = map.remove(GCP_TRACE_SAMPLED) {
        match value.as_bool() {
            Some(sampled) => entry.trace_sampled = Some(sampled),
            None => slot.set(type_mismatch(GCP_TRACE_SAMPLED, "bool", &value)),
        }
    }
    if let Some(value) = map.remove(GCP_LABELS) {
        match value {
            Value::Object(labels) => {
                for (key, label) in labels {
                    match label.as_str() {
                        Some(text) => {
                            entry.labels.insert(key, text.to_string());
                        }
                        None => slot.set(type_mismatch(GCP_LABELS, "string value", &label)),
                    }
                }
            }
            other => slot.set(type_mismatch(GCP_LABELS, "object", &other)),
        }
    }
    if let Some(value) = map.remove(GCP_SOURCE_LOCATION) {
        entry.source_location = lift_source_location(value, slot);
    }
}

fn lift_source_location(value: Value, slot: &mut ErrorSlot) -> Option<SourceLocation> {
    let Value::Object(loc) = value else {
        slot.set(type_mismatch(GCP_SOURCE_LOCATION, "object", &value));
        return None;
    };

    let file = match loc.get("file").and_then(Value::as_str) {
        Some(file) => file.to_string(),
        None => {
            slot.set(DriverError::new(
                "enrich/sourceLocation",
                "missing or non-string \"file\" field",
            ));
            return None;
        }
    };
    let line = match loc.get("line") {
        Some(value) => match value.as_i64() {
            Some(line) => line,
            None => {
                slot.set(type_mismatch(GCP_SOURCE_LOCATION, "integer line", value));
                return None;
            }
        },
        None => {
            slot.set(DriverError::new(
                "enrich/sourceLocation",
                "missing \"line\" field",
            ));
            return None;
        }
    };
    let function = loc
        .get("function")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(SourceLocation {
        file,
        line,
        function,
    })
}

/// Build a structured request description from an access-log payload.
///
/// The source keys are intentionally left in the body; the raw values stay
/// useful there. Mistyped sub-fields record one diagnostic and leave the
/// corresponding field unset; absent optional fields are not an error.
fn lift_http_request(map: &Map<String, Value>, entry: &mut SinkEntry, slot: &mut ErrorSlot) {
    let Some(value) = map.get("request") else {
        return;
    };
    let Some(request) = value.as_object() else {
        slot.set(type_mismatch("request", "object", value));
        return;
    };

    let mut http = HttpRequest {
        https: request.contains_key("tls"),
        ..HttpRequest::default()
    };
    http.method = get_string(request, "method", "request.method", slot);
    http.protocol = get_string(request, "proto", "request.proto", slot);

    let host = get_string(request, "host", "request.host", slot);
    let uri = get_string(request, "uri", "request.uri", slot);
    if let (Some(host), Some(uri)) = (host, uri) {
        let scheme = if http.https { "https" } else { "http" };
        http.url = Some(format!("{scheme}://{host}{uri}"));
    }

    let remote_ip = get_string(request, "remote_ip", "request.remote_ip", slot);
    let remote_port = get_string(request, "remote_port", "request.remote_port", slot);
    http.remote_ip = match (remote_ip, remote_port) {
        (Some(ip), Some(port)) => Some(format!("{ip}:{port}")),
        (Some(ip), None) => Some(ip),
        _ => None,
    };

    if let Some(headers) = request.get("headers").and_then(Value::as_object) {
        http.referer = first_header(headers, "Referer");
        http.user_agent = first_header(headers, "User-Agent");
    }

    http.status = get_i64(map, "status", slot);
    http.response_size = get_i64(map, "size", slot);
    http.request_size = get_i64(map, "bytes_read", slot);
    if let Some(value) = map.get("duration") {
        // try_from rejects negatives, NaN, and values too large to represent.
        match value.as_f64().map(Duration::try_from_secs_f64) {
            Some(Ok(latency)) => http.latency = Some(latency),
            _ => slot.set(type_mismatch("duration", "non-negative seconds", value)),
        }
    }

    entry.http_request = Some(http);
}

fn expect_string(key: &str, value: Value, slot: &mut ErrorSlot) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        other => {
            slot.set(type_mismatch(key, "string", &other));
            None
        }
    }
}

fn first_header(headers: &Map<String, Value>, name: &str) -> Option<String> {
    headers
        .get(name)?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

fn get_string(
    map: &Map<String, Value>,
    key: &str,
    origin_key: &'static str,
    slot: &mut ErrorSlot,
) -> Option<String> {
    let value = map.get(key)?;
    match value.as_str() {
        Some(text) => Some(text.to_string()),
        None => {
            slot.set(type_mismatch(origin_key, "string", value));
            None
        }
    }
}

fn get_i64(map: &Map<String, Value>, key: &'static str, slot: &mut ErrorSlot) -> Option<i64> {
    let value = map.get(key)?;
    match value.as_i64() {
        Some(n) => Some(n),
        None => {
            slot.set(type_mismatch(key, "integer", value));
            None
        }
    }
}

fn type_mismatch(key: &str, expected: &str, got: &Value) -> DriverError {
    DriverError::new(
        "enrich",
        format!("field {key:?}: expected {expected}, got {got}"),
    )
}
