//! Drives a workflow's steps in order and builds the run report.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::{HostprepError, Result};
use crate::logstream::{LogEvent, LogStream};
use crate::steps::{validate_step_name, ExecutionOptions, Step, StepExecutor, StepResult};

use super::report::RunReport;
use super::table::{RunStatusTable, StepQuery};

/// Progress callback for run execution.
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step finished.
    StepFinished { result: &'a StepResult },
}

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

/// Owns the ordered step list for one run.
///
/// Steps run strictly one after another. A failing step never stops the
/// run: every registered step is attempted and the coordinator always
/// reaches [`RunState::Completed`], unless the log itself fails.
#[derive(Debug)]
pub struct RunCoordinator {
    steps: Vec<Step>,
    names: Vec<String>,
    seen: HashSet<String>,
    options: ExecutionOptions,
    state: RunState,
    table: RunStatusTable,
}

impl Default for RunCoordinator {
    fn default() -> Self {
        Self::new(ExecutionOptions::default())
    }
}

impl RunCoordinator {
    /// Create an empty coordinator.
    pub fn new(options: ExecutionOptions) -> Self {
        Self {
            steps: Vec::new(),
            names: Vec::new(),
            seen: HashSet::new(),
            options,
            state: RunState::NotStarted,
            table: RunStatusTable::new(),
        }
    }

    /// Create a coordinator and register `steps` in order.
    pub fn with_steps(
        steps: impl IntoIterator<Item = Step>,
        options: ExecutionOptions,
    ) -> Result<Self> {
        let mut coordinator = Self::new(options);
        for step in steps {
            coordinator.register(step)?;
        }
        Ok(coordinator)
    }

    /// Append a step to the run.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStep` if the name is already registered, or
    /// `InvalidStepName` if it cannot be written into a log marker. Nothing
    /// is written to the log either way.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if self.state != RunState::NotStarted {
            return Err(
                anyhow::anyhow!("cannot register '{}' after the run started", step.name()).into(),
            );
        }
        validate_step_name(step.name())?;
        if !self.seen.insert(step.name().to_string()) {
            return Err(HostprepError::DuplicateStep {
                name: step.name().to_string(),
            });
        }

        self.names.push(step.name().to_string());
        self.steps.push(step);
        Ok(())
    }

    /// Registered step names in run order.
    pub fn step_names(&self) -> &[String] {
        &self.names
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Status of a step in this run; `Unknown` until it is attempted.
    pub fn status(&self, name: &str) -> StepQuery {
        self.table.get(name)
    }

    /// Run every registered step and build the report.
    ///
    /// # Errors
    ///
    /// Returns `LogWrite` if the log fails mid-run; the run stops there and
    /// the log is left with an orphaned START. Step failures are never
    /// errors.
    pub fn run(
        &mut self,
        log: &mut LogStream,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport> {
        if self.state != RunState::NotStarted {
            return Err(anyhow::anyhow!("run has already been started").into());
        }
        self.state = RunState::Running;

        let run_id = new_run_id();
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len();

        tracing::debug!("Run {} starting with {} steps", run_id, total);
        log.append(&LogEvent::RunStart {
            run_id: run_id.clone(),
            steps: self.names.clone(),
        })?;

        let mut executor = StepExecutor::new(log, self.options.clone());
        let mut results = Vec::with_capacity(total);

        for (index, step) in steps.into_iter().enumerate() {
            let name = step.name().to_string();
            on_progress(RunProgress::StepStarting {
                name: &name,
                index,
                total,
            });

            self.table.apply(&LogEvent::StepStart { step: name });
            let result = executor.execute(step)?;
            self.table.apply(&terminal_event(&result));

            on_progress(RunProgress::StepFinished { result: &result });
            results.push(result);
        }

        let mut report = RunReport::from_table(
            Some(run_id.clone()),
            executor.log().path().to_path_buf(),
            &self.names,
            &self.table,
        );
        for (row, result) in report.rows.iter_mut().zip(&results) {
            row.detail = result.detail.clone();
            row.duration = Some(result.duration);
        }

        executor.log_mut().append(&LogEvent::RunEnd {
            run_id: run_id.clone(),
            failures: report.failure_count,
        })?;
        report.completed = true;
        self.state = RunState::Completed;

        tracing::debug!(
            "Run {} completed with {} failures",
            run_id,
            report.failure_count
        );
        Ok(report)
    }
}

/// The marker the executor wrote when `result` finished.
fn terminal_event(result: &StepResult) -> LogEvent {
    match result.exit_code {
        None => LogEvent::StepOk {
            step: result.name.clone(),
        },
        Some(code) => LogEvent::StepError {
            step: result.name.clone(),
            code,
        },
    }
}

/// A run id: UTC start time plus process id.
fn new_run_id() -> String {
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%SZ"), std::process::id())
}
