//! Steps and the actions they run.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::{Settings, SkipCheck, StepConfig};
use crate::error::{HostprepError, Result};
use crate::shell::{execute_streaming, CommandOptions, OutputLine};

use super::capture::OutputCapture;

/// Outcome of running an action.
pub type ActionResult = std::result::Result<(), ActionFailure>;

/// Why an action failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (rc={code})")]
pub struct ActionFailure {
    /// Failure code; normalized to non-zero by the executor.
    pub code: i32,
    /// Short explanation, written to the log.
    pub message: String,
}

impl ActionFailure {
    /// Create a failure with a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a failure from an exit code alone.
    pub fn exit(code: i32) -> Self {
        Self::new(code, format!("exited with code {}", code))
    }
}

/// The side-effecting work a step performs.
///
/// An action runs at most once: `run` consumes it. Everything it wants to
/// say goes through the [`OutputCapture`], which lands in the durable log;
/// actions must not print to the terminal.
pub trait Action: Send {
    /// Short human-readable description (for `list` and dry runs).
    fn describe(&self) -> String {
        "in-process action".to_string()
    }

    /// Run the action to completion.
    fn run(self: Box<Self>, output: &mut OutputCapture<'_>) -> ActionResult;
}

impl<F> Action for F
where
    F: FnOnce(&mut OutputCapture<'_>) -> ActionResult + Send,
{
    fn run(self: Box<Self>, output: &mut OutputCapture<'_>) -> ActionResult {
        (*self)(output)
    }
}

/// A shell command, with its output streamed line by line into the log.
#[derive(Debug, Clone)]
pub struct ShellAction {
    /// Command passed to the shell.
    pub command: String,
    /// Shell, working directory, environment and timeout.
    pub options: CommandOptions,
}

impl ShellAction {
    /// Create a shell action with default options.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: CommandOptions::default(),
        }
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }
}

impl Action for ShellAction {
    fn describe(&self) -> String {
        self.command.clone()
    }

    fn run(self: Box<Self>, output: &mut OutputCapture<'_>) -> ActionResult {
        let result = execute_streaming(&self.command, &self.options, |line| match line {
            OutputLine::Stdout(text) => output.stdout_line(&text),
            OutputLine::Stderr(text) => output.stderr_line(&text),
        });

        match result {
            Ok(result) if result.success => Ok(()),
            Ok(result) if result.timed_out => Err(ActionFailure::new(
                result.failure_code(),
                format!(
                    "timed out after {}s",
                    self.options.timeout.unwrap_or_default().as_secs()
                ),
            )),
            Ok(result) => match result.signal {
                Some(signal) => Err(ActionFailure::new(
                    result.failure_code(),
                    format!("killed by signal {}", signal),
                )),
                None => Err(ActionFailure::exit(result.failure_code())),
            },
            // The capture already holds the log fault; the executor reports it.
            Err(e @ HostprepError::LogWrite { .. }) => Err(ActionFailure::new(1, e.to_string())),
            Err(e) => Err(ActionFailure::new(127, e.to_string())),
        }
    }
}

/// A named unit of work.
pub struct Step {
    name: String,
    description: Option<String>,
    action: Box<dyn Action>,
    skip_if: Option<SkipCheck>,
    check_options: CommandOptions,
}

impl Step {
    /// Create a step from a name and an action.
    pub fn new(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            action: Box::new(action),
            skip_if: None,
            check_options: CommandOptions::default(),
        }
    }

    /// Create a step from a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&mut OutputCapture<'_>) -> ActionResult + Send + 'static,
    {
        Self::new(name, f)
    }

    /// Create a step for a shell command.
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(name, ShellAction::new(command))
    }

    /// Build a step from its workflow file definition.
    pub fn from_config(
        config: &StepConfig,
        settings: &Settings,
        global_env: &HashMap<String, String>,
    ) -> Self {
        let mut env = global_env.clone();
        env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let options = CommandOptions {
            cwd: config.cwd.clone(),
            env,
            shell: settings.shell.clone(),
            timeout: config.effective_timeout(settings),
        };

        let mut step = Self::new(
            config.name.clone(),
            ShellAction {
                command: config.command.clone(),
                options: options.clone(),
            },
        );
        step.description = config.description.clone();
        step.skip_if = config.skip_if.clone();
        // A hung guard is bounded like the step itself.
        step.check_options = options;
        step
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an idempotence guard.
    pub fn with_skip_check(mut self, check: SkipCheck) -> Self {
        self.skip_if = Some(check);
        self
    }

    /// Set the shell options used to evaluate the skip check.
    pub fn with_check_options(mut self, options: CommandOptions) -> Self {
        self.check_options = options;
        self
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// What the action does.
    pub fn describe_action(&self) -> String {
        self.action.describe()
    }

    /// Idempotence guard, if any.
    pub fn skip_check(&self) -> Option<&SkipCheck> {
        self.skip_if.as_ref()
    }

    pub(crate) fn check_options(&self) -> &CommandOptions {
        &self.check_options
    }

    pub(crate) fn into_action(self) -> Box<dyn Action> {
        self.action
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("action", &self.action.describe())
            .field("skip_if", &self.skip_if)
            .finish()
    }
}

/// Check that a name can appear in `=== STEP <name>: ... ===` markers.
pub fn validate_step_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| HostprepError::InvalidStepName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("name contains whitespace"));
    }
    if name.contains([':', '=', ',']) {
        return Err(invalid("name contains ':', '=' or ','"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name contains control characters"));
    }
    Ok(())
}
