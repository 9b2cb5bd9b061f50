//! Summary command implementation.
//!
//! The `hostprep summary` command rebuilds the most recent run's summary
//! from the durable log alone. The login hook calls it, so by default it
//! always exits 0; `--exit-status` makes it report the failure count.

use crate::cli::args::SummaryArgs;
use crate::error::Result;
use crate::runner::summarize_log;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The summary command implementation.
pub struct SummaryCommand {
    context: CommandContext,
    args: SummaryArgs,
}

impl SummaryCommand {
    /// Create a new summary command.
    pub fn new(context: CommandContext, args: SummaryArgs) -> Self {
        Self { context, args }
    }
}

impl Command for SummaryCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        // The workflow only matters for its log path.
        let config = match self.context.log {
            Some(_) => None,
            None => self.context.try_load()?.map(|(_, config)| config),
        };
        let log_path = self.context.log_path(config.as_ref());

        let Some(report) = summarize_log(&log_path)? else {
            if self.args.json {
                ui.raw("null");
            } else {
                ui.message(&format!("No runs recorded in {}", log_path.display()));
            }
            return Ok(CommandResult::success());
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            ui.raw(&json);
        } else {
            ui.show_summary(&report);
        }

        if self.args.exit_status && !report.success() {
            Ok(CommandResult::failure(report.exit_code()))
        } else {
            Ok(CommandResult::success())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RowStatus;
    use crate::ui::MockUI;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const INTERRUPTED: &str = "[2026-10-19T10:00:00Z] === RUN r1: START steps=update,docker ===\n\
                               [2026-10-19T10:00:01Z] === STEP update: START ===\n\
                               [2026-10-19T10:00:02Z] === STEP update: OK ===\n\
                               [2026-10-19T10:00:03Z] === STEP docker: START ===\n";

    fn context(log: &Path) -> CommandContext {
        let cwd = log.parent().unwrap().to_path_buf();
        CommandContext::new(None, Some(log.to_path_buf()), cwd)
    }

    #[test]
    fn summary_derives_from_log() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("l.log");
        fs::write(&log, INTERRUPTED).unwrap();
        let mut ui = MockUI::new();

        let result = SummaryCommand::new(context(&log), SummaryArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        let report = &ui.summaries()[0];
        assert_eq!(report.rows[1].status, RowStatus::Interrupted);
    }

    #[test]
    fn exit_status_flag_reports_failures() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("l.log");
        fs::write(&log, INTERRUPTED).unwrap();
        let mut ui = MockUI::new();

        let args = SummaryArgs {
            exit_status: true,
            ..Default::default()
        };
        let result = SummaryCommand::new(context(&log), args)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn json_output() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("l.log");
        fs::write(&log, INTERRUPTED).unwrap();
        let mut ui = MockUI::new();

        let args = SummaryArgs {
            json: true,
            ..Default::default()
        };
        SummaryCommand::new(context(&log), args)
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.raw_output()[0]).unwrap();
        assert_eq!(value["run_id"], "r1");
        assert_eq!(value["steps"][1]["status"], "interrupted");
    }

    #[test]
    fn missing_log_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let ctx = context(&temp.path().join("none.log"));
        let result = SummaryCommand::new(ctx, SummaryArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("No runs recorded"));
    }
}
