//! The durable, append-only step log.
//!
//! - [`LogStream`] - appends timestamped lines and step markers
//! - [`LogEvent`] / [`LogEntry`] - the line format, parsed back into events
//! - [`read_log`] - read a log file as an ordered list of entries
//!
//! The log outlives any single run: every run on a host appends to the same
//! file, and nothing ever rewrites earlier entries.

pub mod event;
pub mod reader;
pub mod writer;

pub use event::{format_line, format_timestamp, LogEntry, LogEvent, OutputStream};
pub use reader::{parse_log, read_log};
pub use writer::{LogRef, LogStream};

/// Default location of the durable log.
pub const DEFAULT_LOG_PATH: &str = "/var/log/hostprep.log";
