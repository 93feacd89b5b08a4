// src/refresh.rs - log source collaborators and sequence-gated refresh
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::SourceError;

/// Tail sizes the log source accepts per fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FetchLimit {
    #[value(name = "120")]
    Lines120,
    #[value(name = "500")]
    Lines500,
    #[value(name = "1000")]
    Lines1000,
}

impl FetchLimit {
    pub fn lines(self) -> usize {
        match self {
            FetchLimit::Lines120 => 120,
            FetchLimit::Lines500 => 500,
            FetchLimit::Lines1000 => 1000,
        }
    }
}

impl Default for FetchLimit {
    fn default() -> Self {
        FetchLimit::Lines500
    }
}

impl std::fmt::Display for FetchLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines())
    }
}

/// A collaborator that returns the authoritative current tail of the log:
/// an ordered list of raw lines, at most `limit` long, oldest first. No
/// delta or cursor semantics; every fetch is a full replacement.
pub trait LogSource {
    fn fetch(&mut self, limit: FetchLimit) -> Result<Vec<String>, SourceError>;
}

/// File-backed source: each fetch re-reads the file and returns its tail.
/// Stands in for the gateway's log endpoint in the CLI.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl LogSource for FileSource {
    fn fetch(&mut self, limit: FetchLimit) -> Result<Vec<String>, SourceError> {
        let file = File::open(&self.path)?;
        let mut tail: VecDeque<String> = VecDeque::with_capacity(limit.lines());
        for line in BufReader::new(file).lines() {
            let line = line?;
            if tail.len() == limit.lines() {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        Ok(tail.into())
    }
}

/// Ticket identifying one initiated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Orders fetch responses and gates polling on view visibility.
///
/// Each initiated fetch gets a monotonically increasing ticket; a response
/// is admitted only while its ticket is still the latest issued. A slow
/// fetch that completes after a newer one is therefore discarded instead of
/// overwriting the buffer with stale data. There is no cancellation of
/// in-flight fetches.
#[derive(Debug)]
pub struct RefreshGate {
    issued: u64,
    visible: bool,
    immediate: bool,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        RefreshGate {
            issued: 0,
            visible: true,
            immediate: false,
        }
    }

    /// Start a new fetch. Any earlier in-flight ticket becomes stale.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Whether a completed fetch may be applied.
    pub fn admit(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Polling is suspended while the consuming view is hidden.
    pub fn polling(&self) -> bool {
        self.visible
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Track view visibility. Returning to a visible state requests one
    /// immediate refresh instead of waiting for the next tick, so the view
    /// is never stale-on-return.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.immediate = true;
        }
        self.visible = visible;
    }

    /// Consume the immediate-refresh request raised by a visibility return.
    pub fn take_immediate(&mut self) -> bool {
        std::mem::take(&mut self.immediate)
    }
}
