//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use hostprep::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Starting run");
//! ui.error("Cannot write log");
//!
//! assert!(ui.has_message("Starting"));
//! assert!(ui.has_error("log"));
//! ```

use crate::runner::RunReport;
use crate::steps::StepResult;

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    started: Vec<(String, usize, usize)>,
    finished: Vec<StepResult>,
    summaries: Vec<RunReport>,
    raw: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Steps reported as started, as (name, index, total).
    pub fn started(&self) -> &[(String, usize, usize)] {
        &self.started
    }

    /// Steps reported as finished.
    pub fn finished(&self) -> &[StepResult] {
        &self.finished
    }

    /// Get all captured summaries.
    pub fn summaries(&self) -> &[RunReport] {
        &self.summaries
    }

    /// Get all raw output.
    pub fn raw_output(&self) -> &[String] {
        &self.raw
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn step_started(&mut self, name: &str, index: usize, total: usize) {
        self.started.push((name.to_string(), index, total));
    }

    fn step_finished(&mut self, result: &StepResult) {
        self.finished.push(result.clone());
    }

    fn show_summary(&mut self, report: &RunReport) {
        self.summaries.push(report.clone());
    }

    fn raw(&mut self, text: &str) {
        self.raw.push(text.to_string());
    }
}
