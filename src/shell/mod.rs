//! Shell command execution and host privilege checks.

pub mod command;
pub mod platform;

pub use command::{execute_check, execute_streaming, CommandOptions, CommandResult, OutputLine};
pub use platform::{default_shell, is_elevated};
