// src/console.rs - session state and user-facing operations
use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::buffer::RawBuffer;
use crate::error::ConsoleError;
use crate::filter::{self, FilteredLine, LevelFilterSet, ViewFilter, ViewStats};
use crate::record::Level;
use crate::refresh::{FetchLimit, FetchTicket, LogSource, RefreshGate};

/// One operator console session: the raw buffer plus every view-state
/// input. Single-threaded; the view is recomputed synchronously from the
/// current inputs on demand, so no stage ever observes a torn state.
pub struct Console {
    buffer: RawBuffer,
    watermark: Option<i64>,
    levels: LevelFilterSet,
    query: String,
    limit: FetchLimit,
    follow: bool,
    gate: RefreshGate,
}

/// A recomputed view: the windowed rows plus the bookkeeping the caller
/// renders around them.
#[derive(Debug)]
pub struct ConsoleView<'a> {
    /// At most `RENDER_BUDGET` most-recent matching rows, in order.
    pub rendered: Vec<FilteredLine<'a>>,
    /// Matching rows hidden by the render budget.
    pub omitted: usize,
    /// Counters over the full filtered set, not the rendered one.
    pub stats: ViewStats,
    /// Size of the full filtered set.
    pub total_filtered: usize,
    /// Whether the caller should scroll to the latest row on update.
    pub follow: bool,
}

impl Console {
    pub fn new(limit: FetchLimit) -> Self {
        Console {
            buffer: RawBuffer::new(),
            watermark: None,
            levels: LevelFilterSet::all(),
            query: String::new(),
            limit,
            follow: true,
            gate: RefreshGate::new(),
        }
    }

    // --- refresh -----------------------------------------------------------

    /// Start an asynchronous fetch; the returned ticket must accompany the
    /// response handed to `apply_fetch`.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.gate.begin()
    }

    /// Apply a completed fetch. A stale ticket (a newer fetch was started
    /// since) is discarded and the buffer is left untouched.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, lines: Vec<String>) -> bool {
        if !self.gate.admit(ticket) {
            return false;
        }
        self.buffer.replace(lines);
        true
    }

    /// One begin/fetch/apply round-trip against a synchronous source. On
    /// fetch failure the previous buffer stays in place and the error is
    /// returned for the caller to log or ignore; a single failed tick is
    /// never fatal.
    pub fn refresh(&mut self, source: &mut dyn LogSource) -> Result<bool, crate::SourceError> {
        let ticket = self.begin_fetch();
        let lines = source.fetch(self.limit)?;
        Ok(self.apply_fetch(ticket, lines))
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.gate.set_visible(visible);
    }

    /// Consume the immediate-refresh request raised by a visibility return.
    pub fn take_immediate_refresh(&mut self) -> bool {
        self.gate.take_immediate()
    }

    // --- view-state operations ----------------------------------------------

    /// Hide everything currently in view without deleting anything: sets
    /// the watermark to now. Not reset by later refreshes; only a later
    /// `clear` replaces it.
    pub fn clear(&mut self) {
        self.clear_at(Utc::now().timestamp_millis());
    }

    /// `clear` with an explicit watermark, for deterministic callers.
    pub fn clear_at(&mut self, epoch_ms: i64) {
        self.watermark = Some(epoch_ms);
    }

    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    pub fn set_level(&mut self, level: Level, on: bool) {
        self.levels.set(level, on);
    }

    pub fn toggle_level(&mut self, level: Level) {
        self.levels.toggle(level);
    }

    pub fn set_levels(&mut self, levels: LevelFilterSet) {
        self.levels = levels;
    }

    pub fn levels(&self) -> &LevelFilterSet {
        &self.levels
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_limit(&mut self, limit: FetchLimit) {
        self.limit = limit;
    }

    pub fn limit(&self) -> FetchLimit {
        self.limit
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }

    pub fn toggle_follow(&mut self) {
        self.follow = !self.follow;
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn buffer(&self) -> &RawBuffer {
        &self.buffer
    }

    // --- recomputation -------------------------------------------------------

    fn snapshot(&self) -> ViewFilter {
        ViewFilter {
            watermark: self.watermark,
            levels: self.levels.clone(),
            query: self.query.clone(),
        }
    }

    /// The full filtered (pre-window) set.
    pub fn filtered(&self) -> Vec<FilteredLine<'_>> {
        filter::apply(&self.buffer, &self.snapshot())
    }

    /// Recompute the complete view from the current inputs.
    pub fn view(&self) -> ConsoleView<'_> {
        let filtered = self.filtered();
        let stats = filter::stats(&filtered);
        let (rendered, omitted) = filter::window(&filtered);
        ConsoleView {
            rendered: rendered.to_vec(),
            omitted,
            stats,
            total_filtered: filtered.len(),
            follow: self.follow,
        }
    }

    // --- line-level operations -----------------------------------------------

    /// Verbatim raw text of one buffer line, for clipboard hand-off.
    pub fn copy_line(&self, index: usize) -> Option<&str> {
        self.buffer.line(index)
    }

    /// Best-effort copy of one raw line to the system clipboard. Failures
    /// (headless host, no display server) are swallowed.
    pub fn copy_line_to_clipboard(&self, index: usize) -> bool {
        let text = match self.buffer.line(index) {
            Some(text) => text.to_string(),
            None => return false,
        };
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => clipboard.set_text(text).is_ok(),
            Err(_) => false,
        }
    }

    /// Write the currently filtered (pre-window) set to a plain-text file,
    /// one raw line per row, newline-joined. Returns the row count.
    pub fn export(&self, path: &Path) -> Result<usize, ConsoleError> {
        let filtered = self.filtered();
        let text = filtered
            .iter()
            .map(|line| line.raw)
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(path, text).map_err(|source| ConsoleError::Export {
            path: path.display().to_string(),
            source,
        })?;
        Ok(filtered.len())
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::new(FetchLimit::default())
    }
}
