//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations with a shared [`CommandContext`]
//! built from the global flags.

pub mod completions;
pub mod dispatcher;
pub mod install_hook;
pub mod list;
pub mod run;
pub mod summary;
pub mod validate;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
