// src/record.rs
use serde::Serialize;

/// The six recognized severity levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Case-insensitive match of the six level names. Anything else is
    /// unrecognized and yields `None`.
    pub fn from_name(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    /// Numeric severity scale used by flat level-keyed encodings:
    /// `<=10 trace, <=20 debug, <=30 info, <=40 warn, <=50 error, else fatal`.
    pub fn from_number(value: f64) -> Level {
        if value <= 10.0 {
            Level::Trace
        } else if value <= 20.0 {
            Level::Debug
        } else if value <= 30.0 {
            Level::Info
        } else if value <= 40.0 {
            Level::Warn
        } else if value <= 50.0 {
            Level::Error
        } else {
            Level::Fatal
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Position in `Level::ALL`; used for per-level toggle storage.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized view of a raw line, produced when one of the structured
/// shapes matched. Never stored independently of its source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Recognized severity, or `None` when the source carried an
    /// unrecognized level name.
    pub level: Option<Level>,
    /// Epoch milliseconds when a timestamp could be derived. Drives the
    /// watermark filter.
    pub epoch_ms: Option<i64>,
    /// Display-formatted local time, derived from `epoch_ms`.
    pub time: Option<String>,
    /// Short tag identifying the emitting subsystem.
    pub component: Option<String>,
    /// Primary human-readable text; empty string if none was found.
    pub message: String,
    /// Space-joined `key=value` summary of auxiliary fields.
    pub extra: Option<String>,
}

impl LogRecord {
    /// Local `HH:MM:SS.mmm` rendering of an epoch-milliseconds timestamp.
    pub fn format_time(epoch_ms: i64) -> Option<String> {
        use chrono::{Local, TimeZone};
        Local
            .timestamp_millis_opt(epoch_ms)
            .single()
            .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_scale_boundaries() {
        assert_eq!(Level::from_number(1.0), Level::Trace);
        assert_eq!(Level::from_number(10.0), Level::Trace);
        assert_eq!(Level::from_number(11.0), Level::Debug);
        assert_eq!(Level::from_number(20.0), Level::Debug);
        assert_eq!(Level::from_number(30.0), Level::Info);
        assert_eq!(Level::from_number(40.0), Level::Warn);
        assert_eq!(Level::from_number(50.0), Level::Error);
        assert_eq!(Level::from_number(51.0), Level::Fatal);
        assert_eq!(Level::from_number(99.0), Level::Fatal);
    }

    #[test]
    fn test_level_names_case_insensitive() {
        assert_eq!(Level::from_name("INFO"), Some(Level::Info));
        assert_eq!(Level::from_name("Warn"), Some(Level::Warn));
        assert_eq!(Level::from_name("fatal"), Some(Level::Fatal));
        assert_eq!(Level::from_name("notice"), None);
        assert_eq!(Level::from_name(""), None);
    }
}
