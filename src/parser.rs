// src/parser.rs - shape detection and normalization of raw log lines
use serde_json::Value;

use crate::record::{Level, LogRecord};

type JsonMap = serde_json::Map<String, Value>;

/// Level field aliases checked in order of preference.
pub const LEVEL_KEYS: &[&str] = &[
    "level",
    "loglevel",
    "log_level",
    "lvl",
    "severity",
    "levelname",
];

/// Timestamp field aliases checked in order of preference.
pub const TIMESTAMP_KEYS: &[&str] = &["time", "timestamp", "ts", "@timestamp", "date", "datetime"];

/// Message field aliases checked in order of preference.
pub const MESSAGE_KEYS: &[&str] = &["msg", "message", "text", "body"];

/// Subsystem-name field aliases checked in order of preference.
pub const COMPONENT_KEYS: &[&str] = &["module", "component", "name", "logger", "subsystem"];

/// Version/process bookkeeping fields that carry no diagnostic value.
const BOOKKEEPING_KEYS: &[&str] = &["v", "pid", "hostname"];

/// Detection result for one raw line. Detectors run in order; the first
/// match wins, and every step is non-throwing.
#[derive(Debug)]
pub enum Shape {
    /// Plain text, or anything that is not a single JSON object.
    Unstructured,
    /// A JSON object where some object-valued field carries `logLevelName`
    /// (conventionally keyed `_meta`).
    MetaTagged { object: JsonMap, meta_key: String },
    /// Any other JSON object; level/time/message live in top-level fields.
    FlatKeyed { object: JsonMap },
}

/// Classify one raw line into the shape its fields should be read with.
pub fn detect(raw: &str) -> Shape {
    if !raw.starts_with('{') {
        return Shape::Unstructured;
    }
    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        _ => return Shape::Unstructured,
    };
    match find_meta_key(&object) {
        Some(meta_key) => Shape::MetaTagged { object, meta_key },
        None => Shape::FlatKeyed { object },
    }
}

/// Normalize one raw line, or `None` for unstructured input.
///
/// Pure and total: identical input always yields an identical result, and
/// unexpected shapes degrade to a record with fewer populated fields rather
/// than an error.
pub fn parse(raw: &str) -> Option<LogRecord> {
    match detect(raw) {
        Shape::Unstructured => None,
        Shape::MetaTagged { object, meta_key } => Some(parse_meta_tagged(&object, &meta_key)),
        Shape::FlatKeyed { object } => Some(parse_flat_keyed(&object)),
    }
}

fn find_meta_key(object: &JsonMap) -> Option<String> {
    // The conventional key first, then any object field carrying the marker.
    if object.get("_meta").is_some_and(is_meta_object) {
        return Some("_meta".to_string());
    }
    object
        .iter()
        .find(|(_, value)| is_meta_object(value))
        .map(|(key, _)| key.clone())
}

fn is_meta_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key("logLevelName"))
}

fn parse_meta_tagged(object: &JsonMap, meta_key: &str) -> LogRecord {
    let empty = JsonMap::new();
    let meta = object
        .get(meta_key)
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let level = meta
        .get("logLevelName")
        .and_then(Value::as_str)
        .and_then(Level::from_name);

    let epoch_ms = meta
        .get("date")
        .or_else(|| meta.get("time"))
        .or_else(|| object.get("time"))
        .and_then(timestamp_ms);

    let mut component = meta
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    // Positional fields "0".."9": the first plain string becomes the
    // message; embedded JSON payloads are mined for a component tag and
    // flattened into extra; everything else trails into extra.
    let mut message: Option<String> = None;
    let mut extra_parts: Vec<String> = Vec::new();
    for position in 0..10 {
        let value = match object.get(&position.to_string()) {
            Some(value) => value,
            None => continue,
        };
        match value {
            Value::String(text) => {
                if message.is_none() {
                    if let Ok(Value::Object(embedded)) = serde_json::from_str::<Value>(text) {
                        if component.is_none() {
                            component = embedded_component(&embedded);
                        }
                        flatten_into(&mut extra_parts, &embedded);
                    } else {
                        message = Some(text.clone());
                    }
                } else if Some(text.as_str()) != message.as_deref() {
                    extra_parts.push(text.clone());
                }
            }
            Value::Object(embedded) => flatten_into(&mut extra_parts, embedded),
            other => extra_parts.push(compact_value(other)),
        }
    }

    LogRecord {
        level,
        epoch_ms,
        time: epoch_ms.and_then(LogRecord::format_time),
        component,
        message: message.unwrap_or_default(),
        extra: join_extra(extra_parts),
    }
}

fn parse_flat_keyed(object: &JsonMap) -> LogRecord {
    let mut level = None;
    let mut level_key_present = false;
    for key in LEVEL_KEYS {
        if let Some(value) = object.get(*key) {
            level_key_present = true;
            level = match value {
                Value::Number(n) => n.as_f64().map(Level::from_number),
                Value::String(s) => Level::from_name(s),
                _ => None,
            };
            break;
        }
    }
    // A missing level field defaults to info; a present but unrecognized
    // one stays unrecognized so level filtering cannot hide it.
    if !level_key_present {
        level = Some(Level::Info);
    }

    let epoch_ms = TIMESTAMP_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(timestamp_ms);

    let message = MESSAGE_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .map(compact_value)
        .unwrap_or_default();

    let component = COMPONENT_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut extra_parts = Vec::new();
    for (key, value) in object {
        if !is_excluded_key(key) {
            extra_parts.push(format!("{}={}", key, compact_value(value)));
        }
    }

    LogRecord {
        level,
        epoch_ms,
        time: epoch_ms.and_then(LogRecord::format_time),
        component,
        message,
        extra: join_extra(extra_parts),
    }
}

fn is_excluded_key(key: &str) -> bool {
    LEVEL_KEYS.contains(&key)
        || TIMESTAMP_KEYS.contains(&key)
        || MESSAGE_KEYS.contains(&key)
        || COMPONENT_KEYS.contains(&key)
        || BOOKKEEPING_KEYS.contains(&key)
}

/// Derive epoch milliseconds from a timestamp field: numbers are taken as
/// epoch milliseconds, strings go through the ISO-8601 parse cascade.
fn timestamp_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_iso_ms(s),
        _ => None,
    }
}

fn parse_iso_ms(text: &str) -> Option<i64> {
    use chrono::{DateTime, NaiveDateTime};

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    dateparser::parse(text).ok().map(|dt| dt.timestamp_millis())
}

/// Scalar rendering for extra/message values: strings verbatim, everything
/// else (numbers, bools, nested objects/arrays) as compact JSON.
fn compact_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_into(parts: &mut Vec<String>, object: &JsonMap) {
    for (key, value) in object {
        parts.push(format!("{}={}", key, compact_value(value)));
    }
}

fn embedded_component(object: &JsonMap) -> Option<String> {
    ["subsystem", "module", "name"]
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn join_extra(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
