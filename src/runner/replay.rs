//! Rebuild a run report from the durable log alone.
//!
//! The log may hold many runs. Only the segment after the last
//! `=== RUN <id>: START ... ===` marker is current; earlier runs are history.
//! A log without any run marker is treated as a single run whose step order
//! is the order of first START appearance.

use std::path::Path;

use crate::error::Result;
use crate::logstream::{read_log, LogEntry, LogEvent};

use super::report::RunReport;
use super::table::RunStatusTable;

/// Replay the most recent run in `entries`.
///
/// Returns `None` if the log records no run and no step at all. The result
/// depends only on `entries`, so replaying the same log twice gives the same
/// report.
pub fn replay_latest(entries: &[LogEntry], log_path: &Path) -> Option<RunReport> {
    let latest = entries.iter().enumerate().rev().find_map(|(index, e)| match &e.event {
        LogEvent::RunStart { run_id, steps } => Some((index, run_id.clone(), steps.clone())),
        _ => None,
    });

    let (segment, run_id, declared) = match latest {
        Some((index, run_id, steps)) => (&entries[index..], Some(run_id), steps),
        None => (entries, None, Vec::new()),
    };

    let mut table = RunStatusTable::new();
    let mut completed = false;
    for entry in segment {
        match &entry.event {
            LogEvent::RunEnd { run_id: end_id, .. } if Some(end_id) == run_id.as_ref() => {
                completed = true;
            }
            event => table.apply(event),
        }
    }

    if run_id.is_none() && table.is_empty() {
        return None;
    }

    let mut report = RunReport::from_table(run_id, log_path.to_path_buf(), &declared, &table);
    report.completed = completed;
    Some(report)
}

/// Read the log at `path` and replay its most recent run.
///
/// A missing log yields `Ok(None)`.
pub fn summarize_log(path: &Path) -> Result<Option<RunReport>> {
    let entries = read_log(path)?;
    tracing::debug!("Replaying {} log entries from {}", entries.len(), path.display());
    Ok(replay_latest(&entries, path))
}
