//! Append-only log writer.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{HostprepError, Result};

use super::event::{format_line, LogEvent};

/// Byte range of the log file holding one step's activity.
///
/// Lets an operator inspect a step's captured output without re-running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRef {
    /// Log file path.
    pub path: PathBuf,
    /// Offset of the step's START line.
    pub start: u64,
    /// Offset just past the step's terminal line.
    pub end: u64,
}

impl LogRef {
    /// Read the referenced bytes back from the log file.
    pub fn read(&self) -> std::io::Result<String> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.start))?;
        let mut buf = Vec::new();
        file.take(self.end.saturating_sub(self.start))
            .read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Display for LogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (bytes {}..{})", self.path.display(), self.start, self.end)
    }
}

/// The durable, append-only log shared by every run on a host.
///
/// The file is opened in append mode and never truncated. Every call to
/// [`append`](LogStream::append) writes exactly one complete line, so a
/// concurrent `tail -f` only ever sees whole lines.
#[derive(Debug)]
pub struct LogStream {
    path: PathBuf,
    file: File,
    offset: u64,
}

impl LogStream {
    /// Open (creating if needed) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fault = |source| HostprepError::LogWrite {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fault)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(fault)?;
        let mut offset = file.metadata().map_err(fault)?.len();

        // A writer killed mid-line leaves a torn tail; the next marker must
        // start on a line of its own.
        if offset > 0 && !ends_with_newline(&mut file, offset).map_err(fault)? {
            tracing::debug!("Log {} ends mid-line, terminating it", path.display());
            file.write_all(b"\n").map_err(fault)?;
            offset += 1;
        }

        tracing::debug!("Opened log {} at offset {}", path.display(), offset);

        Ok(Self { path, file, offset })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end of the log in bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Append one event as a timestamped line.
    ///
    /// Marker events are synced to disk before returning so that a run killed
    /// right after still leaves its START behind.
    pub fn append(&mut self, event: &LogEvent) -> Result<()> {
        let mut line = format_line(Utc::now(), event);
        if line.contains(['\n', '\r']) {
            line = line.replace(['\n', '\r'], " ");
        }
        line.push('\n');

        self.write_line(line.as_bytes(), event.is_marker())
    }

    /// Append free text as a timestamped line.
    pub fn note(&mut self, text: impl Into<String>) -> Result<()> {
        self.append(&LogEvent::Text(text.into()))
    }

    /// Build a reference from `start` up to the current end of the log.
    pub fn reference_from(&self, start: u64) -> LogRef {
        LogRef {
            path: self.path.clone(),
            start,
            end: self.offset,
        }
    }

    fn write_line(&mut self, bytes: &[u8], sync: bool) -> Result<()> {
        let path = &self.path;
        let fault = |source| HostprepError::LogWrite {
            path: path.clone(),
            source,
        };

        self.file.write_all(bytes).map_err(fault)?;
        self.file.flush().map_err(fault)?;
        if sync {
            self.file.sync_data().map_err(fault)?;
        }
        self.offset += bytes.len() as u64;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
