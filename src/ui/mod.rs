//! Terminal user interface.
//!
//! This module provides:
//! - [`UserInterface`] trait so commands can be tested against [`MockUI`]
//! - [`TerminalUI`] for real terminal output
//! - [`HostprepTheme`] styles and progress line formatting
//!
//! Step actions never write here: their output goes to the durable log.
//! Only progress lines, messages and summaries reach the terminal.
//!
//! # Example
//!
//! ```
//! use hostprep::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("Workflow is valid");
//! assert!(ui.has_success("valid"));
//! ```

pub mod mock;
pub mod output;
pub mod progress;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use progress::{format_duration, format_step_result, format_step_start};
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, HostprepTheme};

use crate::runner::RunReport;
use crate::steps::StepResult;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// A step is about to run.
    fn step_started(&mut self, name: &str, index: usize, total: usize);

    /// A step finished.
    fn step_finished(&mut self, result: &StepResult);

    /// Show the fixed-width summary table. Shown in every output mode.
    fn show_summary(&mut self, report: &RunReport);

    /// Print machine-readable output verbatim. Shown in every output mode.
    fn raw(&mut self, text: &str);
}
