//! Integration tests for the durable log format.

use hostprep::logstream::{parse_log, read_log, LogEvent, LogStream, OutputStream};
use std::fs;
use tempfile::TempDir;

#[test]
fn appended_lines_parse_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("logs").join("run.log");

    let mut log = LogStream::open(&path).unwrap();
    log.append(&LogEvent::StepStart {
        step: "vim".into(),
    })
    .unwrap();
    log.append(&LogEvent::Output {
        step: "vim".into(),
        stream: OutputStream::Stdout,
        text: "Setting up vim".into(),
    })
    .unwrap();
    log.append(&LogEvent::StepError {
        step: "vim".into(),
        code: 100,
    })
    .unwrap();

    let entries = read_log(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.timestamp.is_some()));
    assert_eq!(
        entries[2].event,
        LogEvent::StepError {
            step: "vim".into(),
            code: 100
        }
    );
}

#[test]
fn lines_are_timestamped_and_literal() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("run.log");

    let mut log = LogStream::open(&path).unwrap();
    log.append(&LogEvent::StepOk {
        step: "update".into(),
    })
    .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with('['));
    assert!(text.trim_end().ends_with("] === STEP update: OK ==="));
}

#[test]
fn reopening_appends() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("run.log");

    LogStream::open(&path).unwrap().note("first").unwrap();
    LogStream::open(&path).unwrap().note("second").unwrap();

    let entries = read_log(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].event, LogEvent::Text("second".into()));
}

#[test]
fn foreign_lines_are_kept_as_text() {
    let entries = parse_log(b"kernel: something unrelated\n[2026-10-19T10:00:00Z] hello\n");
    assert_eq!(entries.len(), 2);
    assert!(entries[0].timestamp.is_none());
    assert_eq!(entries[1].event, LogEvent::Text("hello".into()));
}

#[test]
fn torn_last_line_is_parsed() {
    let entries = parse_log(b"[2026-10-19T10:00:00Z] === STEP a: START ===\n[2026-10-19T10:00:01Z] a | par");
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].event,
        LogEvent::Output {
            step: "a".into(),
            stream: OutputStream::Stdout,
            text: "par".into()
        }
    );
}
