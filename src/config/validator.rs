//! Workflow validation rules.
//!
//! This module validates a workflow for correctness before anything runs:
//! - Step names must be unique and usable inside log markers
//! - Steps must have a command
//! - Timeouts must be positive
//! - Skip checks must not be empty

use crate::config::schema::{SkipCheck, WorkflowConfig};
use crate::error::{HostprepError, Result};
use crate::steps::validate_step_name;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String, step: Option<&str>) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            step: step.map(str::to_string),
        }
    }
}

/// Validate a workflow and return all errors.
///
/// Collects every problem rather than stopping at the first one, so the
/// operator can fix the whole file at once.
pub fn validate_config(config: &WorkflowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if config.settings.default_timeout == Some(0) {
        errors.push(ValidationError::new(
            "zero-timeout",
            "settings.default_timeout must be greater than zero".to_string(),
            None,
        ));
    }

    for (index, step) in config.steps.iter().enumerate() {
        let label = if step.name.is_empty() {
            format!("#{}", index + 1)
        } else {
            step.name.clone()
        };

        if let Err(e) = validate_step_name(&step.name) {
            errors.push(ValidationError::new(
                "invalid-name",
                e.to_string(),
                Some(&label),
            ));
        } else if !seen.insert(step.name.as_str()) {
            errors.push(ValidationError::new(
                "duplicate-name",
                format!("Step '{}' is defined more than once", step.name),
                Some(&label),
            ));
        }

        if step.command.trim().is_empty() {
            errors.push(ValidationError::new(
                "missing-command",
                format!("Step '{}' has no command", label),
                Some(&label),
            ));
        }

        if step.timeout == Some(0) {
            errors.push(ValidationError::new(
                "zero-timeout",
                format!("Step '{}' timeout must be greater than zero", label),
                Some(&label),
            ));
        }

        if let Some(check) = &step.skip_if {
            if let Some(problem) = check_problem(check) {
                errors.push(ValidationError::new(
                    "invalid-skip-check",
                    format!("Step '{}' skip_if: {}", label, problem),
                    Some(&label),
                ));
            }
        }
    }

    errors
}

fn check_problem(check: &SkipCheck) -> Option<&'static str> {
    match check {
        SkipCheck::FileExists { path } if path.trim().is_empty() => Some("empty path"),
        SkipCheck::CommandSucceeds { command } if command.trim().is_empty() => {
            Some("empty command")
        }
        SkipCheck::All { checks } | SkipCheck::Any { checks } => {
            if checks.is_empty() {
                Some("no nested checks")
            } else {
                checks.iter().find_map(check_problem)
            }
        }
        _ => None,
    }
}

/// Validate and return a single error summarizing every problem.
pub fn validate(config: &WorkflowConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        Err(HostprepError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
