//! Install-hook command implementation.
//!
//! The `hostprep install-hook` command writes the profile script that shows
//! the last run's summary at interactive login.

use std::path::PathBuf;

use crate::banner::install_login_hook;
use crate::cli::args::InstallHookArgs;
use crate::config::DEFAULT_HOOK_PATH;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The install-hook command implementation.
pub struct InstallHookCommand {
    context: CommandContext,
    args: InstallHookArgs,
}

impl InstallHookCommand {
    /// Create a new install-hook command.
    pub fn new(context: CommandContext, args: InstallHookArgs) -> Self {
        Self { context, args }
    }
}

impl Command for InstallHookCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.try_load()?.map(|(_, config)| config);

        let hook_path = self
            .args
            .path
            .clone()
            .or_else(|| config.as_ref().map(|c| c.settings.hook_path.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOOK_PATH));
        let log_path = self.context.log_path(config.as_ref());
        let binary = std::env::current_exe()?;

        let written = install_login_hook(&hook_path, &binary, &log_path)?;

        ui.success(&format!("Installed login summary hook at {}", written.display()));
        ui.message(&format!("Summaries will be read from {}", log_path.display()));
        Ok(CommandResult::success())
    }
}
