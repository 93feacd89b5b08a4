// src/render.rs - ANSI presentation of the console view
use once_cell::sync::Lazy;
use regex::Regex;
use terminal_size::{terminal_size, Width};

use crate::filter::FilteredLine;
use crate::record::Level;

/// ANSI color codes for the console view. No-color mode is all empty
/// strings so callers never branch.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub timestamp: &'static str,   // Blue for the time prefix
    pub component: &'static str,   // Cyan for the bracketed component tag
    pub extra: &'static str,       // Gray for the extra suffix and chrome
    pub level_error: &'static str, // Red for error/fatal badges
    pub level_warn: &'static str,  // Yellow for warn badges
    pub level_info: &'static str,  // White for info badges
    pub level_debug: &'static str, // Gray for debug/trace badges
    pub highlight: &'static str,   // Inverse video for keyword matches
    pub reset: &'static str,       // Reset to default
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                timestamp: "\x1b[34m",
                component: "\x1b[36m",
                extra: "\x1b[90m",
                level_error: "\x1b[31m",
                level_warn: "\x1b[33m",
                level_info: "\x1b[37m",
                level_debug: "\x1b[90m",
                highlight: "\x1b[7m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                timestamp: "",
                component: "",
                extra: "",
                level_error: "",
                level_warn: "",
                level_info: "",
                level_debug: "",
                highlight: "",
                reset: "",
            }
        }
    }

    pub fn level_color(&self, level: Level) -> &'static str {
        match level {
            Level::Error | Level::Fatal => self.level_error,
            Level::Warn => self.level_warn,
            Level::Info => self.level_info,
            Level::Trace | Level::Debug => self.level_debug,
        }
    }
}

/// Severity words highlighted inside unstructured lines.
static SEVERITY_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(error|warn)\b").unwrap());

const FALLBACK_WIDTH: usize = 80;

/// Terminal width for extra-suffix truncation, 80 when undetectable.
pub fn display_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => w as usize,
        None => FALLBACK_WIDTH,
    }
}

/// Fixed-width badge for the level column.
pub fn level_badge(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRACE",
        Level::Debug => "DEBUG",
        Level::Info => "INFO ",
        Level::Warn => "WARN ",
        Level::Error => "ERROR",
        Level::Fatal => "FATAL",
    }
}

/// Render one visible row. Structured records get a time prefix, level
/// badge, optional bracketed component, message, and a width-truncated
/// extra suffix. Unstructured lines are emitted verbatim with severity
/// words tinted; a non-empty query highlights its first occurrence only.
pub fn render_line(line: &FilteredLine, scheme: &ColorScheme, query: &str, width: usize) -> String {
    match line.record {
        Some(record) => {
            let mut out = String::new();
            let mut cols = 0usize; // plain width, ANSI codes excluded

            if let Some(time) = &record.time {
                out.push_str(scheme.timestamp);
                out.push_str(time);
                out.push_str(scheme.reset);
                out.push(' ');
                cols += time.chars().count() + 1;
            }

            match record.level {
                Some(level) => {
                    out.push_str(scheme.level_color(level));
                    out.push_str(level_badge(level));
                    out.push_str(scheme.reset);
                }
                None => out.push_str("-----"),
            }
            out.push(' ');
            cols += 6;

            if let Some(component) = &record.component {
                out.push_str(scheme.component);
                out.push('[');
                out.push_str(component);
                out.push(']');
                out.push_str(scheme.reset);
                out.push(' ');
                cols += component.chars().count() + 3;
            }

            out.push_str(&highlight_first(&record.message, query, scheme));
            cols += record.message.chars().count();

            if let Some(extra) = &record.extra {
                let budget = width.saturating_sub(cols + 1);
                if budget > 0 {
                    let shown: String = extra.chars().take(budget).collect();
                    out.push(' ');
                    out.push_str(scheme.extra);
                    out.push_str(&shown);
                    if shown.chars().count() < extra.chars().count() {
                        out.push('…');
                    }
                    out.push_str(scheme.reset);
                }
            }
            out
        }
        None => {
            if query.is_empty() {
                highlight_severity_words(line.raw, scheme)
            } else {
                // Keyword highlight takes precedence over severity tinting
                highlight_first(line.raw, query, scheme)
            }
        }
    }
}

/// Highlight only the first occurrence of the query, preserving the
/// matched text's original casing. Additional occurrences are left alone.
pub fn highlight_first(text: &str, query: &str, scheme: &ColorScheme) -> String {
    if query.is_empty() || scheme.highlight.is_empty() {
        return text.to_string();
    }
    let lower = text.to_lowercase();
    // Case folding can change byte offsets outside ASCII; only highlight
    // when the folded text maps one-to-one onto the original.
    if lower.len() != text.len() {
        return text.to_string();
    }
    let needle = query.to_lowercase();
    match lower.find(&needle) {
        Some(start) if text.is_char_boundary(start) && text.is_char_boundary(start + needle.len()) => {
            let end = start + needle.len();
            format!(
                "{}{}{}{}{}",
                &text[..start],
                scheme.highlight,
                &text[start..end],
                scheme.reset,
                &text[end..]
            )
        }
        _ => text.to_string(),
    }
}

fn highlight_severity_words(text: &str, scheme: &ColorScheme) -> String {
    if scheme.reset.is_empty() {
        return text.to_string();
    }
    SEVERITY_WORD
        .replace_all(text, |caps: &regex::Captures| {
            let word = &caps[0];
            let color = if word.eq_ignore_ascii_case("warn") {
                scheme.level_warn
            } else {
                scheme.level_error
            };
            format!("{}{}{}", color, word, scheme.reset)
        })
        .into_owned()
}
