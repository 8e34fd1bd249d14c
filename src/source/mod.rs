//! Event sources feeding the aggregation engine.
//!
//! This module provides a trait-based abstraction over where event lines come
//! from: a live child process, a captured log file, a network stream, or an
//! in-memory channel. Every source hands out tokenized [`Record`]s one at a
//! time.

mod channel;
mod command;
mod file;
pub mod parse;
mod stream;

pub use channel::ChannelSource;
pub use command::CommandSource;
pub use file::FileSource;
pub use parse::{parse_line, Action, LineError, Record};
pub use stream::StreamSource;

use std::fmt::Debug;

/// Trait for receiving event records from various sources.
///
/// # Example
///
/// ```
/// use blockwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("events.log");
/// while let Some(record) = source.poll() {
///     println!("{} {}", record.action, record.event.target());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Take the next available record.
    ///
    /// Returns `None` when nothing is pending right now. This method must be
    /// non-blocking.
    fn poll(&mut self) -> Option<Record>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The most recent error the source ran into, if any.
    fn error(&self) -> Option<String>;
}
