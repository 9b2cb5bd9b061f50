//! Terminal UI.

use console::Term;
use std::io::Write;

use crate::runner::RunReport;
use crate::steps::StepResult;

use super::progress::{format_step_result, format_step_start};
use super::{HostprepTheme, OutputMode, UserInterface};

/// Terminal UI writing to stdout, with errors on stderr.
pub struct TerminalUI {
    term: Term,
    err: Term,
    theme: HostprepTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode, no_color: bool) -> Self {
        Self {
            term: Term::stdout(),
            err: Term::stderr(),
            theme: HostprepTheme::detect(no_color),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn step_started(&mut self, name: &str, index: usize, total: usize) {
        if self.mode.shows_progress() {
            writeln!(
                self.term,
                "{}",
                format_step_start(&self.theme, name, index, total)
            )
            .ok();
        }
    }

    fn step_finished(&mut self, result: &StepResult) {
        if self.mode.shows_progress() {
            writeln!(self.term, "  {}", format_step_result(&self.theme, result)).ok();
        }
    }

    fn show_summary(&mut self, report: &RunReport) {
        let table = report.render_with(|status, text| self.theme.format_status(status, text));
        write!(self.term, "{}", table).ok();
    }

    fn raw(&mut self, text: &str) {
        writeln!(self.term, "{}", text).ok();
    }
}
