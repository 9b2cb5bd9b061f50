//! Idempotence guards.
//!
//! A skip check decides whether a step's effect is already present on the
//! host. When it is, the step is recorded as passed without running its
//! action, which lets the whole workflow be re-run safely.

use std::path::{Path, PathBuf};

use crate::config::SkipCheck;
use crate::shell::{execute_check, CommandOptions};

/// Result of evaluating a skip check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Whether the step's effect is already present.
    pub satisfied: bool,

    /// What was checked, written to the log.
    pub description: String,

    /// Why the check was not satisfied.
    pub details: Option<String>,
}

impl CheckResult {
    fn satisfied(description: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            description: description.into(),
            details: None,
        }
    }

    fn unsatisfied(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            description: description.into(),
            details: Some(details.into()),
        }
    }
}

/// Evaluate a skip check.
///
/// Commands run with the step's shell, working directory and environment.
/// Relative paths resolve against the step's working directory.
pub fn run_check(check: &SkipCheck, options: &CommandOptions) -> CheckResult {
    match check {
        SkipCheck::FileExists { path } => check_file_exists(path, options.cwd.as_deref()),
        SkipCheck::CommandSucceeds { command } => check_command_succeeds(command, options),
        SkipCheck::All { checks } => check_all(checks, options),
        SkipCheck::Any { checks } => check_any(checks, options),
    }
}

fn check_file_exists(path: &str, cwd: Option<&Path>) -> CheckResult {
    let full_path = match cwd {
        Some(cwd) if Path::new(path).is_relative() => cwd.join(path),
        _ => PathBuf::from(path),
    };

    if full_path.exists() {
        CheckResult::satisfied(format!("file exists: {}", path))
    } else {
        CheckResult::unsatisfied(
            format!("file missing: {}", path),
            format!("expected at {}", full_path.display()),
        )
    }
}

fn check_command_succeeds(command: &str, options: &CommandOptions) -> CheckResult {
    if execute_check(command, options) {
        CheckResult::satisfied(format!("command succeeded: {}", truncate(command, 60)))
    } else {
        CheckResult::unsatisfied(
            format!("command failed: {}", truncate(command, 60)),
            "exit code was non-zero",
        )
    }
}

fn check_all(checks: &[SkipCheck], options: &CommandOptions) -> CheckResult {
    // Stop at the first unsatisfied check; later ones may be expensive.
    for check in checks {
        let result = run_check(check, options);
        if !result.satisfied {
            return CheckResult::unsatisfied(
                format!("not all {} checks passed", checks.len()),
                result.description,
            );
        }
    }
    CheckResult::satisfied(format!("all {} checks passed", checks.len()))
}

fn check_any(checks: &[SkipCheck], options: &CommandOptions) -> CheckResult {
    let mut missed = Vec::new();
    for check in checks {
        let result = run_check(check, options);
        if result.satisfied {
            return CheckResult::satisfied(result.description);
        }
        missed.push(result.description);
    }
    CheckResult::unsatisfied(
        format!("none of {} checks passed", checks.len()),
        missed.join("; "),
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn in_dir(dir: &Path) -> CommandOptions {
        CommandOptions {
            cwd: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    fn file(path: &str) -> SkipCheck {
        SkipCheck::FileExists {
            path: path.to_string(),
        }
    }

    #[test]
    fn file_exists_relative_to_cwd() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("done.flag"), "").unwrap();

        assert!(run_check(&file("done.flag"), &in_dir(temp.path())).satisfied);
        assert!(!run_check(&file("other.flag"), &in_dir(temp.path())).satisfied);
    }

    #[test]
    fn file_exists_absolute_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abs.txt");
        fs::write(&path, "").unwrap();

        let check = file(&path.to_string_lossy());
        assert!(run_check(&check, &CommandOptions::default()).satisfied);
    }

    #[test]
    fn missing_file_reports_expected_location() {
        let temp = TempDir::new().unwrap();
        let result = run_check(&file("nope"), &in_dir(temp.path()));
        assert!(result.details.unwrap().contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn command_succeeds_uses_exit_status() {
        let temp = TempDir::new().unwrap();
        let ok = SkipCheck::CommandSucceeds {
            command: "exit 0".into(),
        };
        let fail = SkipCheck::CommandSucceeds {
            command: "exit 3".into(),
        };

        assert!(run_check(&ok, &in_dir(temp.path())).satisfied);
        assert!(!run_check(&fail, &in_dir(temp.path())).satisfied);
    }

    #[cfg(unix)]
    #[test]
    fn command_succeeds_sees_step_env() {
        let mut options = CommandOptions::default();
        options.env.insert("HOSTPREP_MARK".into(), "yes".into());

        let check = SkipCheck::CommandSucceeds {
            command: "test \"$HOSTPREP_MARK\" = yes".into(),
        };
        assert!(run_check(&check, &options).satisfied);
    }

    #[cfg(unix)]
    #[test]
    fn hung_guard_command_is_bounded_by_timeout() {
        let options = CommandOptions {
            timeout: Some(std::time::Duration::from_millis(300)),
            ..Default::default()
        };
        let started = std::time::Instant::now();

        let result = run_check(
            &SkipCheck::CommandSucceeds {
                command: "sleep 30".into(),
            },
            &options,
        );

        assert!(!result.satisfied);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn all_requires_every_check() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "").unwrap();

        let check = SkipCheck::All {
            checks: vec![file("a"), file("b")],
        };
        let result = run_check(&check, &in_dir(temp.path()));
        assert!(!result.satisfied);
        assert_eq!(result.details.as_deref(), Some("file missing: b"));

        fs::write(temp.path().join("b"), "").unwrap();
        assert!(run_check(&check, &in_dir(temp.path())).satisfied);
    }

    #[test]
    fn any_needs_one_check() {
        let temp = TempDir::new().unwrap();
        let check = SkipCheck::Any {
            checks: vec![file("a"), file("b")],
        };
        assert!(!run_check(&check, &in_dir(temp.path())).satisfied);

        fs::write(temp.path().join("b"), "").unwrap();
        let result = run_check(&check, &in_dir(temp.path()));
        assert!(result.satisfied);
        assert_eq!(result.description, "file exists: b");
    }

    #[test]
    fn long_commands_are_truncated() {
        let command = "echo ".to_string() + &"a".repeat(100);
        assert!(truncate(&command, 60).chars().count() == 60);
        assert_eq!(truncate("short", 60), "short");
    }
}
