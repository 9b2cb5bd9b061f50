//! Workflow file schema.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::logstream::DEFAULT_LOG_PATH;

/// Default location of the login-banner profile script.
pub const DEFAULT_HOOK_PATH: &str = "/etc/profile.d/hostprep-summary.sh";

/// Root of a workflow file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Human-readable name shown in the run header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Global settings.
    pub settings: Settings,

    /// Environment exported to every step.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Steps in execution order.
    pub steps: Vec<StepConfig>,
}

/// Global workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Durable log location.
    pub log_path: PathBuf,

    /// Shell that interprets step commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<PathBuf>,

    /// Timeout in seconds applied to steps without their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<u64>,

    /// Refuse to run unless the effective user is root.
    pub require_root: bool,

    /// Where `install-hook` writes the login banner script.
    pub hook_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            shell: None,
            default_timeout: None,
            require_root: true,
            hook_path: PathBuf::from(DEFAULT_HOOK_PATH),
        }
    }
}

/// A single step definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepConfig {
    /// Unique step name.
    pub name: String,

    /// One-line description for `list`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Shell command to execute.
    pub command: String,

    /// Timeout in seconds (overrides `settings.default_timeout`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Working directory for the command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Step-specific environment variables.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Guard that marks the step as already satisfied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<SkipCheck>,
}

impl StepConfig {
    /// Effective timeout for this step.
    pub fn effective_timeout(&self, settings: &Settings) -> Option<Duration> {
        self.timeout
            .or(settings.default_timeout)
            .map(Duration::from_secs)
    }
}

/// Idempotence guard for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipCheck {
    /// Satisfied if a file or directory exists.
    FileExists {
        /// Absolute path, or relative to the step's working directory
        path: String,
    },

    /// Satisfied if a command succeeds (exit code 0).
    CommandSucceeds {
        /// Command to run
        command: String,
    },

    /// Satisfied if every nested check is.
    All {
        /// Nested checks
        checks: Vec<SkipCheck>,
    },

    /// Satisfied if any nested check is.
    Any {
        /// Nested checks
        checks: Vec<SkipCheck>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_workflow() {
        let yaml = r#"
steps:
  - name: update
    command: apt-get update
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.steps.len(), 1);
        assert_eq!(config.steps[0].name, "update");
        assert_eq!(config.settings.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert!(config.settings.require_root);
    }

    #[test]
    fn parses_full_workflow() {
        let yaml = r#"
name: workstation
settings:
  log_path: /tmp/prep.log
  shell: /bin/bash
  default_timeout: 600
  require_root: false
env:
  DEBIAN_FRONTEND: noninteractive
steps:
  - name: docker
    description: Docker engine
    command: sh get-docker.sh
    timeout: 900
    cwd: /opt/bootstrap
    env:
      CHANNEL: stable
    skip_if:
      type: any
      checks:
        - type: command_succeeds
          command: command -v docker
        - type: file_exists
          path: /usr/bin/docker
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.name.as_deref(), Some("workstation"));
        assert_eq!(config.settings.shell, Some(PathBuf::from("/bin/bash")));
        assert!(!config.settings.require_root);
        assert_eq!(config.env["DEBIAN_FRONTEND"], "noninteractive");

        let step = &config.steps[0];
        assert_eq!(step.timeout, Some(900));
        assert_eq!(step.env["CHANNEL"], "stable");
        assert!(matches!(step.skip_if, Some(SkipCheck::Any { ref checks }) if checks.len() == 2));
    }

    #[test]
    fn step_order_is_preserved() {
        let yaml = r#"
steps:
  - { name: c, command: "true" }
  - { name: a, command: "true" }
  - { name: b, command: "true" }
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = config.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r#"
steps:
  - name: a
    comand: typo
"#;
        assert!(serde_yaml::from_str::<WorkflowConfig>(yaml).is_err());
    }

    #[test]
    fn effective_timeout_prefers_step_value() {
        let settings = Settings {
            default_timeout: Some(60),
            ..Default::default()
        };
        let mut step = StepConfig::default();
        assert_eq!(
            step.effective_timeout(&settings),
            Some(Duration::from_secs(60))
        );

        step.timeout = Some(5);
        assert_eq!(
            step.effective_timeout(&settings),
            Some(Duration::from_secs(5))
        );

        assert_eq!(step.effective_timeout(&Settings::default()), None);
    }
}
