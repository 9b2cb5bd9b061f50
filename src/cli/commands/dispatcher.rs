//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandContext`] for the global flags every command shares
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config, WorkflowConfig};
use crate::error::{HostprepError, Result};
use crate::logstream::DEFAULT_LOG_PATH;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// `--config` / `HOSTPREP_CONFIG`.
    pub config: Option<PathBuf>,
    /// `--log` / `HOSTPREP_LOG`.
    pub log: Option<PathBuf>,
    /// Directory searched for `hostprep.yml`.
    pub cwd: PathBuf,
}

impl CommandContext {
    /// Create a context from the global flags.
    pub fn new(config: Option<PathBuf>, log: Option<PathBuf>, cwd: PathBuf) -> Self {
        Self { config, log, cwd }
    }

    /// Discover, load and validate the workflow.
    pub fn load(&self) -> Result<(PathBuf, WorkflowConfig)> {
        load_config(self.config.as_deref(), &self.cwd)
    }

    /// Load the workflow if there is one.
    ///
    /// A missing workflow is only tolerated when none was asked for
    /// explicitly.
    pub fn try_load(&self) -> Result<Option<(PathBuf, WorkflowConfig)>> {
        match self.load() {
            Ok(loaded) => Ok(Some(loaded)),
            Err(HostprepError::ConfigNotFound { .. }) if self.config.is_none() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Log path: `--log`, then the workflow's setting, then the default.
    pub fn log_path(&self, config: Option<&WorkflowConfig>) -> PathBuf {
        self.log
            .clone()
            .or_else(|| config.map(|c| c.settings.log_path.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Get the shared command context.
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Get the working directory.
    pub fn cwd(&self) -> &Path {
        &self.context.cwd
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        match &cli.command {
            Some(Commands::Run(args)) => super::run::RunCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Summary(args)) => {
                super::summary::SummaryCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::List) => super::list::ListCommand::new(ctx).execute(ui),
            Some(Commands::Validate) => super::validate::ValidateCommand::new(ctx).execute(ui),
            Some(Commands::InstallHook(args)) => {
                super::install_hook::InstallHookCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => {
                // Default to run command with default args
                super::run::RunCommand::new(ctx, RunArgs::default()).execute(ui)
            }
        }
    }
}
