// src/filter.rs - watermark/level/keyword filtering, render window, stats
use crate::buffer::RawBuffer;
use crate::record::{Level, LogRecord};

/// Upper bound on rows materialized for display in a single view.
pub const RENDER_BUDGET: usize = 300;

/// Per-level visibility toggles. Default: all six visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFilterSet {
    enabled: [bool; 6],
}

impl Default for LevelFilterSet {
    fn default() -> Self {
        LevelFilterSet { enabled: [true; 6] }
    }
}

impl LevelFilterSet {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn none() -> Self {
        LevelFilterSet {
            enabled: [false; 6],
        }
    }

    pub fn only(levels: &[Level]) -> Self {
        let mut set = Self::none();
        for level in levels {
            set.set(*level, true);
        }
        set
    }

    pub fn set(&mut self, level: Level, on: bool) {
        self.enabled[level.index()] = on;
    }

    pub fn toggle(&mut self, level: Level) {
        self.enabled[level.index()] = !self.enabled[level.index()];
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.enabled[level.index()]
    }
}

/// Immutable snapshot of every view-state input for one recomputation
/// pass. Built fresh from session state each time so the pipeline stays a
/// pure function of its arguments.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    /// Epoch milliseconds; lines with a derivable timestamp at or before
    /// this are hidden. Timestamp-less lines always stay visible.
    pub watermark: Option<i64>,
    pub levels: LevelFilterSet,
    /// Case-insensitive substring matched against the raw line text.
    pub query: String,
}

/// One line that survived filtering, paired with its normalized view.
#[derive(Debug, Clone, Copy)]
pub struct FilteredLine<'a> {
    /// Position in the raw buffer.
    pub index: usize,
    pub raw: &'a str,
    pub record: Option<&'a LogRecord>,
}

/// Apply the watermark, level, and keyword filters in that fixed order,
/// preserving the buffer's original ordering. The filters are mutually
/// independent; ambiguity always resolves in favor of visibility.
pub fn apply<'a>(buffer: &'a RawBuffer, filter: &ViewFilter) -> Vec<FilteredLine<'a>> {
    let query = filter.query.to_lowercase();
    let mut out = Vec::new();
    for index in 0..buffer.len() {
        let raw = match buffer.line(index) {
            Some(raw) => raw,
            None => continue,
        };
        let record = buffer.record(index);

        // Watermark: only lines with a derivable timestamp can be hidden.
        if let (Some(mark), Some(ms)) = (filter.watermark, record.and_then(|r| r.epoch_ms)) {
            if ms <= mark {
                continue;
            }
        }
        // Level: unstructured and unrecognized-level lines always pass.
        if let Some(level) = record.and_then(|r| r.level) {
            if !filter.levels.enabled(level) {
                continue;
            }
        }
        // Keyword: matched against the raw text so extra content stays
        // discoverable.
        if !query.is_empty() && !raw.to_lowercase().contains(&query) {
            continue;
        }

        out.push(FilteredLine { index, raw, record });
    }
    out
}

/// Cap a filtered view to the render budget, keeping the most recent rows
/// in order. Returns the visible suffix and how many leading rows were
/// omitted. Purely a display bound: stats are computed before this.
pub fn window<'a, 'b>(filtered: &'b [FilteredLine<'a>]) -> (&'b [FilteredLine<'a>], usize) {
    let omitted = filtered.len().saturating_sub(RENDER_BUDGET);
    (&filtered[omitted..], omitted)
}

/// Error/warning counters over the filtered (pre-window) set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewStats {
    /// Records at `error` or `fatal`.
    pub errors: usize,
    /// Records at `warn`.
    pub warns: usize,
}

pub fn stats(filtered: &[FilteredLine]) -> ViewStats {
    let mut out = ViewStats::default();
    for line in filtered {
        match line.record.and_then(|r| r.level) {
            Some(Level::Error) | Some(Level::Fatal) => out.errors += 1,
            Some(Level::Warn) => out.warns += 1,
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_of(lines: &[&str]) -> RawBuffer {
        let mut buffer = RawBuffer::new();
        buffer.replace(lines.iter().map(|s| s.to_string()).collect());
        buffer
    }

    fn flat(level: &str, time: Option<i64>, msg: &str) -> String {
        match time {
            Some(t) => format!(r#"{{"level":"{}","time":{},"msg":"{}"}}"#, level, t, msg),
            None => format!(r#"{{"level":"{}","msg":"{}"}}"#, level, msg),
        }
    }

    #[test]
    fn test_watermark_spares_timestampless_lines() {
        let a = flat("info", Some(100), "A");
        let c = flat("info", Some(200), "C");
        let buffer = buffer_of(&[&a, "B has no timestamp", &c]);
        let filter = ViewFilter {
            watermark: Some(150),
            ..ViewFilter::default()
        };
        let visible = apply(&buffer, &filter);
        let raws: Vec<&str> = visible.iter().map(|l| l.raw).collect();
        assert_eq!(raws, vec!["B has no timestamp", c.as_str()]);
    }

    #[test]
    fn test_watermark_boundary_is_inclusive() {
        let a = flat("info", Some(150), "at-mark");
        let b = flat("info", Some(151), "after-mark");
        let buffer = buffer_of(&[&a, &b]);
        let filter = ViewFilter {
            watermark: Some(150),
            ..ViewFilter::default()
        };
        let visible = apply(&buffer, &filter);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].record.unwrap().message, "after-mark");
    }

    #[test]
    fn test_level_filter_spares_unstructured_and_unrecognized() {
        let mut lines: Vec<String> = (0..10).map(|i| flat("info", None, &format!("i{}", i))).collect();
        lines.push("unstructured noise".to_string());
        lines.push(flat("error", None, "boom"));
        lines.push(r#"{"level":"notice","msg":"odd"}"#.to_string());
        let buffer = buffer_of(&lines.iter().map(String::as_str).collect::<Vec<_>>());

        let filter = ViewFilter {
            levels: LevelFilterSet::only(&[Level::Error]),
            ..ViewFilter::default()
        };
        let visible = apply(&buffer, &filter);
        let raws: Vec<&str> = visible.iter().map(|l| l.raw).collect();
        assert_eq!(
            raws,
            vec![
                "unstructured noise",
                lines[11].as_str(),
                r#"{"level":"notice","msg":"odd"}"#
            ]
        );
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive_on_raw_text() {
        let buffer = buffer_of(&[
            r#"{"level":"info","msg":"hello","peer":"Gateway-7"}"#,
            "plain GATEWAY mention",
            r#"{"level":"info","msg":"unrelated"}"#,
        ]);
        let filter = ViewFilter {
            query: "gateway".to_string(),
            ..ViewFilter::default()
        };
        let visible = apply(&buffer, &filter);
        // Matches in extra-bearing fields count because the raw text is
        // what gets searched.
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].index, 0);
        assert_eq!(visible[1].index, 1);
    }

    #[test]
    fn test_filters_preserve_original_order() {
        let lines: Vec<String> = (0..20).map(|i| flat("info", Some(i), &format!("m{}", i))).collect();
        let buffer = buffer_of(&lines.iter().map(String::as_str).collect::<Vec<_>>());
        let visible = apply(&buffer, &ViewFilter::default());
        let indices: Vec<usize> = visible.iter().map(|l| l.index).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_budget_arithmetic() {
        let lines: Vec<String> = (0..400).map(|i| flat("info", None, &format!("m{}", i))).collect();
        let buffer = buffer_of(&lines.iter().map(String::as_str).collect::<Vec<_>>());
        let filtered = apply(&buffer, &ViewFilter::default());
        assert_eq!(filtered.len(), 400);

        let (rendered, omitted) = window(&filtered);
        assert_eq!(rendered.len(), RENDER_BUDGET);
        assert_eq!(omitted, 100);
        // Suffix semantics: the oldest rows fall off
        assert_eq!(rendered[0].record.unwrap().message, "m100");
        assert_eq!(rendered[299].record.unwrap().message, "m399");
    }

    #[test]
    fn test_window_under_budget_passes_through() {
        let lines: Vec<String> = (0..5).map(|i| flat("info", None, &format!("m{}", i))).collect();
        let buffer = buffer_of(&lines.iter().map(String::as_str).collect::<Vec<_>>());
        let filtered = apply(&buffer, &ViewFilter::default());
        let (rendered, omitted) = window(&filtered);
        assert_eq!(rendered.len(), 5);
        assert_eq!(omitted, 0);
    }

    #[test]
    fn test_stats_computed_over_filtered_not_windowed() {
        // More error lines than the render budget: the count must still be
        // the true total.
        let lines: Vec<String> = (0..350)
            .map(|i| flat("error", None, &format!("e{}", i)))
            .collect();
        let buffer = buffer_of(&lines.iter().map(String::as_str).collect::<Vec<_>>());
        let filtered = apply(&buffer, &ViewFilter::default());
        let counted = stats(&filtered);
        assert_eq!(counted.errors, 350);

        let (rendered, _) = window(&filtered);
        assert_eq!(rendered.len(), RENDER_BUDGET);
    }

    #[test]
    fn test_stats_level_buckets() {
        let fatal = flat("fatal", None, "f");
        let error = flat("error", None, "e");
        let warn = flat("warn", None, "w");
        let info = flat("info", None, "i");
        let buffer = buffer_of(&[&fatal, &error, &warn, &info, "unstructured"]);
        let filtered = apply(&buffer, &ViewFilter::default());
        let counted = stats(&filtered);
        assert_eq!(counted, ViewStats { errors: 2, warns: 1 });
    }
}
