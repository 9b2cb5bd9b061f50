//! Visual theme and styling.

use console::Style;

use crate::runner::RowStatus;

/// hostprep's terminal theme.
#[derive(Debug, Clone)]
pub struct HostprepTheme {
    /// Style for passing steps (green).
    pub success: Style,
    /// Style for warnings (orange).
    pub warning: Style,
    /// Style for errors (red bold).
    pub error: Style,
    /// Style for interrupted steps (yellow).
    pub interrupted: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for durations (dim).
    pub duration: Style,
    /// Style for step counters (dim).
    pub step_number: Style,
}

impl Default for HostprepTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl HostprepTheme {
    /// Create the colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            interrupted: Style::new().yellow(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            duration: Style::new().dim(),
            step_number: Style::new().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            interrupted: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            duration: Style::new(),
            step_number: Style::new(),
        }
    }

    /// Pick the theme for the current terminal.
    pub fn detect(no_color: bool) -> Self {
        if !no_color && should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a header line.
    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.header.apply_to("▶"), self.highlight.apply_to(title))
    }

    /// Style a summary table status cell.
    pub fn format_status(&self, status: RowStatus, text: &str) -> String {
        let style = match status {
            RowStatus::Pass => &self.success,
            RowStatus::Error => &self.error,
            RowStatus::Interrupted => &self.interrupted,
            RowStatus::NotRun => &self.dim,
        };
        format!("{}", style.apply_to(text))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stdout is a TTY
    console::Term::stdout().is_term()
}
