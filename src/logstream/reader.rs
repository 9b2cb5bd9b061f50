//! Reading the log back as ordered events.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

use super::event::LogEntry;

/// Read and parse the whole log file.
///
/// A missing log is not an error: it reads as empty, meaning nothing has run.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_log(path: &Path) -> Result<Vec<LogEntry>> {
    match fs::read(path) {
        Ok(bytes) => Ok(parse_log(&bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parse raw log bytes into entries, one per line, keeping byte offsets.
///
/// A trailing line without newline (a writer caught mid-line) is still parsed.
pub fn parse_log(bytes: &[u8]) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    let mut offset = 0u64;

    for raw in bytes.split_inclusive(|b| *b == b'\n') {
        let len = raw.len() as u64;
        let content = raw.strip_suffix(b"\n").unwrap_or(raw);
        let content = content.strip_suffix(b"\r").unwrap_or(content);
        let line = String::from_utf8_lossy(content);

        if !line.trim().is_empty() {
            entries.push(LogEntry::parse_line(&line, offset, len));
        }
        offset += len;
    }

    entries
}
