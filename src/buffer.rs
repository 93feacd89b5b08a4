// src/buffer.rs
use once_cell::unsync::OnceCell;

use crate::parser;
use crate::record::LogRecord;

/// Holds the most recently fetched tail of the log.
///
/// The source returns the authoritative current tail, not a delta, so each
/// fetch replaces the buffer wholesale. No dedup, no reordering: duplicate
/// lines are legal and keep their positions. Parse results are memoized
/// per line and dropped on replacement.
#[derive(Default)]
pub struct RawBuffer {
    lines: Vec<String>,
    parsed: Vec<OnceCell<Option<LogRecord>>>,
}

impl RawBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire buffer with the latest fetch result, invalidating
    /// every memoized parse result.
    pub fn replace(&mut self, lines: Vec<String>) {
        self.parsed = (0..lines.len()).map(|_| OnceCell::new()).collect();
        self.lines = lines;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Verbatim raw text of one line.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Memoized normalized view of one line; `None` for unstructured lines.
    pub fn record(&self, index: usize) -> Option<&LogRecord> {
        let line = self.lines.get(index)?;
        self.parsed[index].get_or_init(|| parser::parse(line)).as_ref()
    }
}
