//! Output verbosity.

/// How much of a run reaches the terminal.
///
/// The summary table is printed in every mode; step output never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show per-step progress lines and the summary.
    #[default]
    Normal,
    /// Show only the summary and errors.
    Quiet,
}

impl OutputMode {
    /// Mode selected by the `--quiet` flag.
    pub fn from_quiet(quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Whether progress lines and status messages are shown.
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal)
    }
}
