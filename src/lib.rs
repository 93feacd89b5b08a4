// src/lib.rs
pub mod buffer;
pub mod console;
pub mod error;
pub mod filter;
pub mod parser;
pub mod record;
pub mod refresh;
pub mod render;

pub use error::*;

pub use buffer::RawBuffer;
pub use console::{Console, ConsoleView};
pub use filter::{FilteredLine, LevelFilterSet, ViewFilter, ViewStats, RENDER_BUDGET};
pub use parser::parse;
pub use record::{Level, LogRecord};
pub use refresh::{FetchLimit, FetchTicket, FileSource, LogSource, RefreshGate};
