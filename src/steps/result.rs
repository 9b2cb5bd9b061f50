//! Step outcomes.

use std::fmt;
use std::time::Duration;

use crate::logstream::LogRef;

/// Outcome of a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The action succeeded, or its skip check was already satisfied.
    Pass,

    /// The action failed with the given (non-zero) code.
    Error,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Pass => '✓',
            StepStatus::Error => '✗',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pass => "pass",
            StepStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Result of executing one step. Created once, never modified.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name.
    pub name: String,

    /// Pass or Error.
    pub status: StepStatus,

    /// Failure code when `status` is `Error`; never `Some(0)`.
    pub exit_code: Option<i32>,

    /// Where the step's captured output lives in the log.
    pub log_ref: LogRef,

    /// Wall-clock time from START to the terminal marker.
    pub duration: Duration,

    /// Whether the action was skipped because its check was satisfied.
    pub skipped: bool,

    /// Failure message, or what made the step already satisfied.
    pub detail: Option<String>,
}

impl StepResult {
    /// Whether the step passed.
    pub fn passed(&self) -> bool {
        self.status == StepStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(StepStatus::Pass.to_string(), "pass");
        assert_eq!(StepStatus::Error.to_string(), "error");
        assert_eq!(StepStatus::Error.display_char(), '✗');
    }
}
