//! Error types for hostprep operations.
//!
//! This module defines [`HostprepError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - A failing step is *not* an error: it is recorded as data in a
//!   [`StepResult`](crate::steps::StepResult) and the run continues
//! - `HostprepError` covers faults that make the run itself impossible
//!   (bad configuration, an unwritable log)
//! - Use `anyhow::Error` (via `HostprepError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hostprep operations.
#[derive(Debug, Error)]
pub enum HostprepError {
    /// Workflow file not found at expected location.
    #[error("Workflow file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse workflow file.
    #[error("Failed to parse workflow at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid workflow structure or values.
    #[error("Invalid workflow: {message}")]
    ConfigValidationError { message: String },

    /// Two steps in one run share a name.
    #[error("Duplicate step name: {name}")]
    DuplicateStep { name: String },

    /// Step name cannot be written into a log marker unambiguously.
    #[error("Invalid step name '{name}': {reason}")]
    InvalidStepName { name: String, reason: String },

    /// The durable log could not be opened or appended to.
    #[error("Cannot write log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shell command could not be run.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// The workflow needs administrative privilege.
    #[error("This workflow must run as root (use --allow-unprivileged to override)")]
    NotElevated,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HostprepError {
    /// Whether this error comes from loading or validating the workflow file.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HostprepError::ConfigNotFound { .. }
                | HostprepError::ConfigParseError { .. }
                | HostprepError::ConfigValidationError { .. }
                | HostprepError::DuplicateStep { .. }
                | HostprepError::InvalidStepName { .. }
        )
    }

    /// Process exit status for a run that could not happen at all.
    ///
    /// Workflow and privilege problems exit 2; every other fault exits
    /// 255 so it never collides with a clamped failure count.
    pub fn exit_code(&self) -> u8 {
        if self.is_config_error() || matches!(self, HostprepError::NotElevated) {
            2
        } else {
            255
        }
    }
}

/// Result type alias for hostprep operations.
pub type Result<T> = std::result::Result<T, HostprepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = HostprepError::ConfigNotFound {
            path: PathBuf::from("/etc/hostprep/workflow.yml"),
        };
        assert!(err.to_string().contains("/etc/hostprep/workflow.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = HostprepError::ConfigParseError {
            path: PathBuf::from("/workflow.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/workflow.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn duplicate_step_displays_name() {
        let err = HostprepError::DuplicateStep {
            name: "docker".into(),
        };
        assert!(err.to_string().contains("docker"));
    }

    #[test]
    fn log_write_displays_path_and_cause() {
        let err = HostprepError::LogWrite {
            path: PathBuf::from("/var/log/hostprep.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/hostprep.log"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = HostprepError::CommandFailed {
            command: "apt-get update".into(),
            code: Some(100),
        };
        let msg = err.to_string();
        assert!(msg.contains("apt-get update"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn config_errors_are_classified() {
        assert!(HostprepError::DuplicateStep { name: "a".into() }.is_config_error());
        assert!(HostprepError::ConfigValidationError {
            message: "x".into()
        }
        .is_config_error());
        assert!(!HostprepError::NotElevated.is_config_error());
    }

    #[test]
    fn exit_codes_separate_setup_faults() {
        assert_eq!(
            HostprepError::ConfigNotFound {
                path: PathBuf::from("x")
            }
            .exit_code(),
            2
        );
        assert_eq!(HostprepError::NotElevated.exit_code(), 2);
        let io = HostprepError::Io(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), 255);
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: HostprepError = io_err.into();
        assert!(matches!(err, HostprepError::Io(_)));
    }
}
