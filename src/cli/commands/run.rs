//! Run command implementation.
//!
//! The `hostprep run` command executes the workflow: every selected step in
//! declared order, with progress on the terminal and all step output in the
//! durable log, followed by the summary table.

use std::collections::HashSet;

use crate::cli::args::RunArgs;
use crate::config::{StepConfig, WorkflowConfig};
use crate::error::{HostprepError, Result};
use crate::logstream::LogStream;
use crate::runner::{RunCoordinator, RunProgress};
use crate::shell::is_elevated;
use crate::steps::{ExecutionOptions, Step};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    context: CommandContext,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(context: CommandContext, args: RunArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Apply `--only` and `--skip` to the declared step list.
    fn select_steps<'c>(&self, config: &'c WorkflowConfig) -> Result<Vec<&'c StepConfig>> {
        let known: HashSet<&str> = config.steps.iter().map(|s| s.name.as_str()).collect();
        let unknown: Vec<&str> = self
            .args
            .only
            .iter()
            .chain(&self.args.skip)
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(HostprepError::ConfigValidationError {
                message: format!("Unknown step(s): {}", unknown.join(", ")),
            });
        }

        Ok(config
            .steps
            .iter()
            .filter(|s| self.args.only.is_empty() || self.args.only.contains(&s.name))
            .filter(|s| !self.args.skip.contains(&s.name))
            .collect())
    }

    fn show_dry_run(
        &self,
        ui: &mut dyn UserInterface,
        config: &WorkflowConfig,
        steps: &[&StepConfig],
    ) {
        ui.show_header(&format!(
            "{} (dry run, {} steps)",
            config.name.as_deref().unwrap_or("hostprep"),
            steps.len()
        ));
        for (index, step) in steps.iter().enumerate() {
            ui.message(&format!("[{}/{}] {}", index + 1, steps.len(), step.name));
            ui.message(&format!("      $ {}", step.command));
            if let Some(timeout) = step.effective_timeout(&config.settings) {
                ui.message(&format!("      timeout {}s", timeout.as_secs()));
            }
            if step.skip_if.is_some() && !self.args.force {
                ui.message("      skipped when already satisfied");
            }
        }
        ui.message("Dry run: nothing was executed or logged.");
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (path, config) = self.context.load()?;
        tracing::debug!("Running workflow from {}", path.display());

        let selected = self.select_steps(&config)?;

        if self.args.dry_run {
            self.show_dry_run(ui, &config, &selected);
            return Ok(CommandResult::success());
        }

        if config.settings.require_root && !self.args.allow_unprivileged && !is_elevated() {
            return Err(HostprepError::NotElevated);
        }

        let steps = selected
            .iter()
            .map(|s| Step::from_config(s, &config.settings, &config.env));
        let mut coordinator = RunCoordinator::with_steps(
            steps,
            ExecutionOptions {
                force: self.args.force,
            },
        )?;

        let log_path = self.context.log_path(Some(&config));
        let mut log = LogStream::open(&log_path)?;

        ui.show_header(&format!(
            "{} ({} steps)",
            config.name.as_deref().unwrap_or("hostprep"),
            selected.len()
        ));
        ui.message(&format!("Logging to {}", log_path.display()));

        let report = coordinator.run(&mut log, |progress| match progress {
            RunProgress::StepStarting { name, index, total } => ui.step_started(name, index, total),
            RunProgress::StepFinished { result } => ui.step_finished(result),
        })?;

        ui.show_summary(&report);

        if report.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(report.exit_code()))
        }
    }
}
