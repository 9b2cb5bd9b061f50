//! Command-line interface for hostprep.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, InstallHookArgs, RunArgs, SummaryArgs};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
