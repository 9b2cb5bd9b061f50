//! Log line format and marker events.
//!
//! Every line of the durable log has the shape `[<timestamp>] <text>`.
//! Step and run boundaries are recognizable by literal markers:
//!
//! ```text
//! [2026-10-19T12:00:00Z] === RUN 20261019T120000Z-4242: START steps=update,docker ===
//! [2026-10-19T12:00:00Z] === STEP update: START ===
//! [2026-10-19T12:00:03Z] update | Hit:1 http://archive.ubuntu.com/ubuntu noble InRelease
//! [2026-10-19T12:00:04Z] === STEP update: OK ===
//! [2026-10-19T12:00:04Z] === STEP docker: START ===
//! [2026-10-19T12:00:05Z] docker ! curl: (6) Could not resolve host
//! [2026-10-19T12:00:05Z] === STEP docker: ERROR rc=6 ===
//! [2026-10-19T12:00:05Z] === RUN 20261019T120000Z-4242: END failures=1 ===
//! ```

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

static LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]*)\] ?(.*)$").expect("LINE_REGEX must compile")
});

static STEP_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=== STEP (\S+): (START|OK|ERROR rc=(-?\d+)) ===$")
        .expect("STEP_MARKER_REGEX must compile")
});

static RUN_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=== RUN (\S+): START steps=(\S*) ===$").expect("RUN_START_REGEX must compile")
});

static RUN_END_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=== RUN (\S+): END failures=(\d+) ===$").expect("RUN_END_REGEX must compile")
});

static OUTPUT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) ([|!])(?: (.*))?$").expect("OUTPUT_REGEX must compile")
});

/// Which stream of an action a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn tag(self) -> char {
        match self {
            OutputStream::Stdout => '|',
            OutputStream::Stderr => '!',
        }
    }
}

/// A single event recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A run began; `steps` is its declared step order.
    RunStart { run_id: String, steps: Vec<String> },
    /// A run reached `Completed`.
    RunEnd { run_id: String, failures: usize },
    /// A step began executing.
    StepStart { step: String },
    /// A step finished successfully.
    StepOk { step: String },
    /// A step finished with a failure code.
    StepError { step: String, code: i32 },
    /// A line of captured action output.
    Output {
        step: String,
        stream: OutputStream,
        text: String,
    },
    /// Anything else.
    Text(String),
}

impl LogEvent {
    /// The step this event belongs to, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            LogEvent::StepStart { step }
            | LogEvent::StepOk { step }
            | LogEvent::StepError { step, .. }
            | LogEvent::Output { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Whether this is a START/OK/ERROR or RUN marker.
    pub fn is_marker(&self) -> bool {
        !matches!(self, LogEvent::Output { .. } | LogEvent::Text(_))
    }

    /// Parse the text portion of a log line (everything after the timestamp).
    pub fn parse(text: &str) -> Self {
        if let Some(caps) = STEP_MARKER_REGEX.captures(text) {
            let step = caps[1].to_string();
            return match &caps[2] {
                "START" => LogEvent::StepStart { step },
                "OK" => LogEvent::StepOk { step },
                _ => match caps[3].parse::<i32>() {
                    Ok(code) => LogEvent::StepError { step, code },
                    Err(_) => LogEvent::Text(text.to_string()),
                },
            };
        }

        if let Some(caps) = RUN_START_REGEX.captures(text) {
            let steps = caps[2]
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            return LogEvent::RunStart {
                run_id: caps[1].to_string(),
                steps,
            };
        }

        if let Some(caps) = RUN_END_REGEX.captures(text) {
            if let Ok(failures) = caps[2].parse() {
                return LogEvent::RunEnd {
                    run_id: caps[1].to_string(),
                    failures,
                };
            }
        }

        if let Some(caps) = OUTPUT_REGEX.captures(text) {
            let stream = if &caps[2] == "|" {
                OutputStream::Stdout
            } else {
                OutputStream::Stderr
            };
            return LogEvent::Output {
                step: caps[1].to_string(),
                stream,
                text: caps.get(3).map_or("", |m| m.as_str()).to_string(),
            };
        }

        LogEvent::Text(text.to_string())
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::RunStart { run_id, steps } => {
                write!(f, "=== RUN {}: START steps={} ===", run_id, steps.join(","))
            }
            LogEvent::RunEnd { run_id, failures } => {
                write!(f, "=== RUN {}: END failures={} ===", run_id, failures)
            }
            LogEvent::StepStart { step } => write!(f, "=== STEP {}: START ===", step),
            LogEvent::StepOk { step } => write!(f, "=== STEP {}: OK ===", step),
            LogEvent::StepError { step, code } => {
                write!(f, "=== STEP {}: ERROR rc={} ===", step, code)
            }
            LogEvent::Output { step, stream, text } => {
                if text.is_empty() {
                    write!(f, "{} {}", step, stream.tag())
                } else {
                    write!(f, "{} {} {}", step, stream.tag(), text)
                }
            }
            LogEvent::Text(text) => f.write_str(text),
        }
    }
}

/// One parsed line of the log, with its byte span in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Timestamp from the line prefix, if it parsed.
    pub timestamp: Option<DateTime<Utc>>,
    /// The event carried by the line.
    pub event: LogEvent,
    /// Byte offset of the first byte of this line.
    pub offset: u64,
    /// Byte length of this line including its newline.
    pub len: u64,
}

impl LogEntry {
    /// Parse one line (without its trailing newline).
    pub fn parse_line(line: &str, offset: u64, len: u64) -> Self {
        let (timestamp, event) = match LINE_REGEX.captures(line) {
            Some(caps) => (
                DateTime::parse_from_rfc3339(&caps[1])
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                LogEvent::parse(&caps[2]),
            ),
            None => (None, LogEvent::Text(line.to_string())),
        };

        Self {
            timestamp,
            event,
            offset,
            len,
        }
    }

    /// Byte offset just past this line.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Render a full log line, without the trailing newline.
pub fn format_line(timestamp: DateTime<Utc>, event: &LogEvent) -> String {
    format!("[{}] {}", format_timestamp(timestamp), event)
}

/// Timestamp format used in log lines: RFC 3339, UTC, second precision.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
