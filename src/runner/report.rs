//! Run reports and the fixed-width summary table.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::table::{RunStatusTable, StepQuery};

/// Highest exit status a failing run reports.
pub const MAX_FAILURE_EXIT: usize = 254;

const BANNER_WIDTH: usize = 60;

/// Status of one row in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Pass,
    Error,
    /// Started but never finished (orphaned START).
    Interrupted,
    /// Declared in the run but never started.
    NotRun,
}

impl RowStatus {
    fn from_query(query: StepQuery) -> (Self, Option<i32>) {
        match query {
            StepQuery::Unknown => (RowStatus::NotRun, None),
            StepQuery::Running => (RowStatus::Interrupted, None),
            StepQuery::Pass => (RowStatus::Pass, None),
            StepQuery::Error(code) => (RowStatus::Error, Some(code)),
        }
    }

    /// Whether this row counts towards the failure count.
    pub fn is_failure(&self) -> bool {
        matches!(self, RowStatus::Error | RowStatus::Interrupted)
    }
}

/// One `(name, status)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub duration: Option<Duration>,
}

/// Ordered outcome of one run plus its aggregate failure count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Run identifier from the RUN START marker, if the run had one.
    pub run_id: Option<String>,
    /// Log the run was recorded in.
    pub log_path: PathBuf,
    /// Whether the run reached its END marker.
    pub completed: bool,
    /// Rows in declared order.
    #[serde(rename = "steps")]
    pub rows: Vec<ReportRow>,
    /// Number of rows that failed or were interrupted.
    pub failure_count: usize,
}

impl RunReport {
    /// Build a report from a status table.
    ///
    /// Rows follow `declared`; attempted steps missing from it are appended
    /// in the order they started.
    pub fn from_table(
        run_id: Option<String>,
        log_path: PathBuf,
        declared: &[String],
        table: &RunStatusTable,
    ) -> Self {
        let extra = table
            .attempted()
            .filter(|name| !declared.iter().any(|d| d == name))
            .map(str::to_string)
            .collect::<Vec<_>>();

        let rows: Vec<ReportRow> = declared
            .iter()
            .chain(extra.iter())
            .map(|name| {
                let (status, exit_code) = RowStatus::from_query(table.get(name));
                ReportRow {
                    name: name.clone(),
                    status,
                    exit_code,
                    detail: None,
                    duration: None,
                }
            })
            .collect();

        let failure_count = rows.iter().filter(|r| r.status.is_failure()).count();

        Self {
            run_id,
            log_path,
            completed: false,
            rows,
            failure_count,
        }
    }

    /// Whether every row passed.
    pub fn success(&self) -> bool {
        self.failure_count == 0
    }

    /// Process exit status: `0`, or the failure count clamped to `1..=254`.
    pub fn exit_code(&self) -> i32 {
        self.failure_count.min(MAX_FAILURE_EXIT) as i32
    }

    /// Render the summary table as plain text.
    pub fn render(&self) -> String {
        self.render_with(|_, text| text.to_string())
    }

    /// Render the summary table, passing each status cell through `style`.
    pub fn render_with(&self, style: impl Fn(RowStatus, &str) -> String) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(20);
        let rule = "=".repeat(BANNER_WIDTH);

        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        match &self.run_id {
            Some(id) => {
                let _ = writeln!(out, " hostprep summary (run {})", id);
            }
            None => {
                let _ = writeln!(out, " hostprep summary");
            }
        }
        let _ = writeln!(out, "{}", rule);

        if self.rows.is_empty() {
            let _ = writeln!(out, " (no steps)");
        }
        for row in &self.rows {
            let cell = self.status_text(row);
            let _ = writeln!(
                out,
                " {:<width$}  {}",
                row.name,
                style(row.status, &cell),
                width = width
            );
        }

        let _ = writeln!(out, "{}", rule);
        out
    }

    fn status_text(&self, row: &ReportRow) -> String {
        match row.status {
            RowStatus::Pass => "PASS".to_string(),
            RowStatus::Error => format!("ERROR - see {}", self.log_path.display()),
            RowStatus::Interrupted => format!("INTERRUPTED - see {}", self.log_path.display()),
            RowStatus::NotRun => "NOT RUN".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstream::LogEvent;

    fn table(events: &[LogEvent]) -> RunStatusTable {
        let mut table = RunStatusTable::new();
        table.apply_all(events);
        table
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_follow_declared_order() {
        let t = table(&[
            LogEvent::StepStart { step: "b".into() },
            LogEvent::StepOk { step: "b".into() },
            LogEvent::StepStart { step: "a".into() },
            LogEvent::StepError {
                step: "a".into(),
                code: 5,
            },
        ]);
        let report = RunReport::from_table(None, "/l".into(), &names(&["a", "b", "c"]), &t);

        let rows: Vec<_> = report
            .rows
            .iter()
            .map(|r| (r.name.as_str(), r.status, r.exit_code))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("a", RowStatus::Error, Some(5)),
                ("b", RowStatus::Pass, None),
                ("c", RowStatus::NotRun, None),
            ]
        );
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn exit_code_is_clamped() {
        let report = RunReport {
            run_id: None,
            log_path: "/l".into(),
            completed: true,
            rows: Vec::new(),
            failure_count: 1000,
        };
        assert_eq!(report.exit_code(), 254);
    }

    #[test]
    fn render_shows_pass_and_error_with_log_path() {
        let t = table(&[
            LogEvent::StepStart {
                step: "update".into(),
            },
            LogEvent::StepOk {
                step: "update".into(),
            },
            LogEvent::StepStart {
                step: "firewall".into(),
            },
        ]);
        let report = RunReport::from_table(
            Some("r1".into()),
            "/var/log/hostprep.log".into(),
            &names(&["update", "firewall"]),
            &t,
        );
        let text = report.render();

        assert!(text.contains("hostprep summary (run r1)"));
        assert!(text.contains(" update                PASS"));
        assert!(text.contains("INTERRUPTED - see /var/log/hostprep.log"));
        assert_eq!(text.lines().filter(|l| l.starts_with("====")).count(), 3);
    }

    #[test]
    fn json_uses_snake_case_statuses() {
        let t = table(&[LogEvent::StepStart { step: "x".into() }]);
        let report = RunReport::from_table(None, "/l".into(), &names(&["x", "y"]), &t);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["steps"][0]["status"], "interrupted");
        assert_eq!(json["steps"][1]["status"], "not_run");
        assert_eq!(json["failure_count"], 1);
    }
}
