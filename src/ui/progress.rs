//! Per-step progress lines.

use std::time::Duration;

use crate::steps::{StepResult, StepStatus};

use super::HostprepTheme;

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// `[2/5] docker` shown when a step starts.
pub fn format_step_start(theme: &HostprepTheme, name: &str, index: usize, total: usize) -> String {
    format!(
        "{} {}",
        theme.step_number.apply_to(format!("[{}/{}]", index + 1, total)),
        name
    )
}

/// One line describing a finished step.
pub fn format_step_result(theme: &HostprepTheme, result: &StepResult) -> String {
    let duration = theme
        .duration
        .apply_to(format!("({})", format_duration(result.duration)));

    match result.status {
        StepStatus::Pass if result.skipped => format!(
            "{} {}",
            theme.format_success(&format!("{} already satisfied", result.name)),
            duration
        ),
        StepStatus::Pass => format!("{} {}", theme.format_success(&result.name), duration),
        StepStatus::Error => format!(
            "{} {}",
            theme.format_error(&format!(
                "{} failed rc={}",
                result.name,
                result.exit_code.unwrap_or(1)
            )),
            duration
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstream::LogRef;

    fn result(status: StepStatus, exit_code: Option<i32>, skipped: bool) -> StepResult {
        StepResult {
            name: "docker".into(),
            status,
            exit_code,
            log_ref: LogRef {
                path: "/l".into(),
                start: 0,
                end: 0,
            },
            duration: Duration::from_millis(1200),
            skipped,
            detail: None,
        }
    }

    #[test]
    fn format_duration_milliseconds() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }

    #[test]
    fn format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_secs_f64(5.3)), "5.3s");
    }

    #[test]
    fn format_duration_minutes() {
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn start_line_counts_from_one() {
        let theme = HostprepTheme::plain();
        assert_eq!(format_step_start(&theme, "vim", 0, 3), "[1/3] vim");
    }

    #[test]
    fn result_lines() {
        let theme = HostprepTheme::plain();
        assert_eq!(
            format_step_result(&theme, &result(StepStatus::Pass, None, false)),
            "✓ docker (1.2s)"
        );
        assert_eq!(
            format_step_result(&theme, &result(StepStatus::Pass, None, true)),
            "✓ docker already satisfied (1.2s)"
        );
        assert_eq!(
            format_step_result(&theme, &result(StepStatus::Error, Some(7), false)),
            "✗ docker failed rc=7 (1.2s)"
        );
    }
}
