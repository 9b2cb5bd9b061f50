//! Scoped output capture for one action invocation.
//!
//! An [`OutputCapture`] binds two sinks, stdout and stderr, to a single step
//! for the duration of its action. Every line lands in the durable log tagged
//! with the step name. Partial lines are flushed when the capture is finished
//! or dropped, so a panicking action still leaves all of its output behind
//! before the executor writes the terminal marker.

use std::io::{self, Write};

use crate::error::{HostprepError, Result};
use crate::logstream::{LogEvent, LogStream, OutputStream};

/// Output sinks for one step's action.
#[derive(Debug)]
pub struct OutputCapture<'a> {
    log: &'a mut LogStream,
    step: String,
    pending: [Vec<u8>; 2],
    fault: Option<HostprepError>,
    lines: usize,
}

impl<'a> OutputCapture<'a> {
    pub(crate) fn new(log: &'a mut LogStream, step: &str) -> Self {
        Self {
            log,
            step: step.to_string(),
            pending: [Vec::new(), Vec::new()],
            fault: None,
            lines: 0,
        }
    }

    /// Name of the step this capture belongs to.
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Number of output lines written so far.
    pub fn lines_captured(&self) -> usize {
        self.lines
    }

    /// Record one complete stdout line.
    pub fn stdout_line(&mut self, text: &str) -> Result<()> {
        self.emit(OutputStream::Stdout, text)
    }

    /// Record one complete stderr line.
    pub fn stderr_line(&mut self, text: &str) -> Result<()> {
        self.emit(OutputStream::Stderr, text)
    }

    /// Record a note about the step that is not action output.
    pub fn note(&mut self, text: &str) -> Result<()> {
        self.check_fault()?;
        let event = LogEvent::Text(format!("{}: {}", self.step, text));
        self.log.append(&event).map_err(|e| self.record_fault(e))
    }

    /// A byte sink for stdout, for use with `write!`.
    pub fn stdout(&mut self) -> CaptureWriter<'_, 'a> {
        CaptureWriter {
            capture: self,
            stream: OutputStream::Stdout,
        }
    }

    /// A byte sink for stderr, for use with `write!`.
    pub fn stderr(&mut self) -> CaptureWriter<'_, 'a> {
        CaptureWriter {
            capture: self,
            stream: OutputStream::Stderr,
        }
    }

    /// Flush partial lines and report the first log fault, if any.
    pub(crate) fn finish(mut self) -> Result<()> {
        self.flush_pending();
        match self.fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn emit(&mut self, stream: OutputStream, text: &str) -> Result<()> {
        self.check_fault()?;
        let event = LogEvent::Output {
            step: self.step.clone(),
            stream,
            text: text.to_string(),
        };
        self.log.append(&event).map_err(|e| self.record_fault(e))?;
        self.lines += 1;
        Ok(())
    }

    fn push_bytes(&mut self, stream: OutputStream, bytes: &[u8]) -> Result<()> {
        let idx = slot(stream);
        self.pending[idx].extend_from_slice(bytes);

        while let Some(pos) = self.pending[idx].iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending[idx].drain(..=pos).collect();
            self.emit(stream, &decode(&line))?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) {
        for stream in [OutputStream::Stdout, OutputStream::Stderr] {
            let rest = std::mem::take(&mut self.pending[slot(stream)]);
            if !rest.is_empty() {
                let _ = self.emit(stream, &decode(&rest));
            }
        }
    }

    fn check_fault(&self) -> Result<()> {
        match &self.fault {
            Some(_) => Err(HostprepError::LogWrite {
                path: self.log.path().to_path_buf(),
                source: io::Error::other("log became unwritable earlier in this step"),
            }),
            None => Ok(()),
        }
    }

    /// Keep the first fault for `finish` and hand the caller an equivalent.
    fn record_fault(&mut self, fault: HostprepError) -> HostprepError {
        let copy = HostprepError::LogWrite {
            path: self.log.path().to_path_buf(),
            source: io::Error::other(fault.to_string()),
        };
        self.fault.get_or_insert(fault);
        copy
    }
}

impl Drop for OutputCapture<'_> {
    fn drop(&mut self) {
        self.flush_pending();
    }
}

fn slot(stream: OutputStream) -> usize {
    match stream {
        OutputStream::Stdout => 0,
        OutputStream::Stderr => 1,
    }
}

fn decode(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// `io::Write` adapter over one stream of an [`OutputCapture`].
#[derive(Debug)]
pub struct CaptureWriter<'c, 'a> {
    capture: &'c mut OutputCapture<'a>,
    stream: OutputStream,
}

impl Write for CaptureWriter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.capture
            .push_bytes(self.stream, buf)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
