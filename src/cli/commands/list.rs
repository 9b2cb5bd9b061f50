//! List command implementation.
//!
//! The `hostprep list` command shows the workflow's steps in execution
//! order without running anything.

use crate::config::{SkipCheck, WorkflowConfig};
use crate::error::Result;
use crate::ui::theme::HostprepTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    context: CommandContext,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    fn show_steps(&self, ui: &mut dyn UserInterface, config: &WorkflowConfig) {
        let theme = HostprepTheme::new();
        let total = config.steps.len();

        for (index, step) in config.steps.iter().enumerate() {
            ui.message(&format!(
                "  {} {} {} {}",
                theme
                    .step_number
                    .apply_to(format!("{}/{}", index + 1, total)),
                theme.highlight.apply_to(&step.name),
                theme.dim.apply_to("-"),
                step.command
            ));

            if let Some(ref desc) = step.description {
                ui.message(&format!("      {}", theme.dim.apply_to(desc)));
            }
            if let Some(timeout) = step.effective_timeout(&config.settings) {
                ui.message(&format!(
                    "      {}",
                    theme
                        .dim
                        .apply_to(format!("timeout: {}s", timeout.as_secs()))
                ));
            }
            if let Some(ref check) = step.skip_if {
                ui.message(&format!(
                    "      {}",
                    theme
                        .dim
                        .apply_to(format!("skip if: {}", describe_check(check)))
                ));
            }
        }
    }
}

/// One-line rendering of a skip check.
fn describe_check(check: &SkipCheck) -> String {
    match check {
        SkipCheck::FileExists { path } => format!("{} exists", path),
        SkipCheck::CommandSucceeds { command } => format!("`{}` succeeds", command),
        SkipCheck::All { checks } => join_checks(checks, " and "),
        SkipCheck::Any { checks } => join_checks(checks, " or "),
    }
}

fn join_checks(checks: &[SkipCheck], separator: &str) -> String {
    let parts: Vec<String> = checks.iter().map(describe_check).collect();
    format!("({})", parts.join(separator))
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (path, config) = self.context.load()?;

        ui.show_header(&format!(
            "{} ({})",
            config.name.as_deref().unwrap_or("hostprep"),
            path.display()
        ));

        if config.steps.is_empty() {
            ui.message("  (no steps)");
        } else {
            self.show_steps(ui, &config);
        }

        Ok(CommandResult::success())
    }
}
