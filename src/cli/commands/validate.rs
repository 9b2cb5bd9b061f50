//! Validate command implementation.
//!
//! The `hostprep validate` command checks the workflow file and reports
//! every problem at once instead of stopping at the first.

use crate::config::{load_config_file, validate_config, ConfigPaths};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// Exit code for an invalid workflow, shared with configuration errors.
const INVALID_EXIT: i32 = 2;

/// The validate command implementation.
pub struct ValidateCommand {
    context: CommandContext,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = ConfigPaths::new(self.context.config.as_deref(), &self.context.cwd).resolve()?;
        let config = load_config_file(&path)?;

        let errors = validate_config(&config);
        if errors.is_empty() {
            ui.success(&format!(
                "{} is valid ({} steps)",
                path.display(),
                config.steps.len()
            ));
            return Ok(CommandResult::success());
        }

        for error in &errors {
            match &error.step {
                Some(step) => ui.error(&format!("[{}] {}: {}", error.rule, step, error.message)),
                None => ui.error(&format!("[{}] {}", error.rule, error.message)),
            }
        }
        ui.message(&format!(
            "{} problem(s) in {}",
            errors.len(),
            path.display()
        ));

        Ok(CommandResult::failure(INVALID_EXIT))
    }
}
