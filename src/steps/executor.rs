//! Step execution engine.
//!
//! Runs one step in isolation: START marker, skip check, action with its
//! output captured into the log, then exactly one OK or ERROR marker. A
//! failing step is returned as data; only a log fault is an `Err`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::Instant;

use crate::error::Result;
use crate::logstream::{LogEvent, LogStream};

use super::capture::OutputCapture;
use super::check::run_check;
use super::result::{StepResult, StepStatus};
use super::step::{ActionFailure, Step};

/// Code recorded when an in-process action panics.
pub const PANIC_CODE: i32 = 101;

static ACTION_PANIC_HOOK: Once = Once::new();

thread_local! {
    static IN_ACTION: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Keep panics raised inside actions off the terminal.
///
/// The hook is process-wide but only swallows panics on a thread that is
/// currently running an action; their location is kept for the step's log.
/// Every other panic goes to the previously installed hook.
fn install_action_panic_hook() {
    ACTION_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_ACTION.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()));
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Options for step execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Ignore skip checks and always run the action.
    pub force: bool,
}

/// Executes steps against a durable log.
#[derive(Debug)]
pub struct StepExecutor<'a> {
    log: &'a mut LogStream,
    options: ExecutionOptions,
}

struct Invocation {
    failure: Option<ActionFailure>,
    skipped: bool,
    detail: Option<String>,
}

impl<'a> StepExecutor<'a> {
    /// Create an executor writing to `log`.
    pub fn new(log: &'a mut LogStream, options: ExecutionOptions) -> Self {
        Self { log, options }
    }

    /// Log the executor is writing to.
    pub fn log(&self) -> &LogStream {
        &*self.log
    }

    /// Mutable access to the log, for markers outside any step.
    pub fn log_mut(&mut self) -> &mut LogStream {
        &mut *self.log
    }

    /// Execute a step, consuming it.
    ///
    /// # Errors
    ///
    /// Returns `LogWrite` if the log cannot be written. A failing action is
    /// never an error: it comes back as a `StepResult` with `Error` status.
    pub fn execute(&mut self, step: Step) -> Result<StepResult> {
        let name = step.name().to_string();
        let start_offset = self.log.offset();
        let started = Instant::now();

        tracing::debug!("Starting step {}", name);
        self.log.append(&LogEvent::StepStart { step: name.clone() })?;

        let invocation = self.invoke(&name, step)?;

        let (status, exit_code) = match &invocation.failure {
            None => {
                self.log.append(&LogEvent::StepOk { step: name.clone() })?;
                (StepStatus::Pass, None)
            }
            Some(failure) => {
                // A failure reported with code 0 would read as success.
                let code = if failure.code == 0 { 1 } else { failure.code };
                self.log.append(&LogEvent::StepError {
                    step: name.clone(),
                    code,
                })?;
                (StepStatus::Error, Some(code))
            }
        };

        let duration = started.elapsed();
        tracing::debug!("Step {} finished: {} in {:?}", name, status, duration);

        Ok(StepResult {
            name,
            status,
            exit_code,
            log_ref: self.log.reference_from(start_offset),
            duration,
            skipped: invocation.skipped,
            detail: invocation.detail,
        })
    }

    fn invoke(&mut self, name: &str, step: Step) -> Result<Invocation> {
        let mut capture = OutputCapture::new(&mut *self.log, name);

        if !self.options.force {
            if let Some(check) = step.skip_check() {
                let result = run_check(check, step.check_options());
                if result.satisfied {
                    let detail = format!("already satisfied: {}", result.description);
                    let _ = capture.note(&detail);
                    capture.finish()?;
                    return Ok(Invocation {
                        failure: None,
                        skipped: true,
                        detail: Some(detail),
                    });
                }
                let _ = capture.note(&format!("not yet satisfied: {}", result.description));
            }
        }

        let action = step.into_action();
        install_action_panic_hook();
        PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
        IN_ACTION.with(|flag| flag.set(true));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| action.run(&mut capture)));
        IN_ACTION.with(|flag| flag.set(false));

        let outcome = outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            let message = match PANIC_LOCATION.with(|slot| slot.borrow_mut().take()) {
                Some(location) => format!("action panicked at {}: {}", location, message),
                None => format!("action panicked: {}", message),
            };
            Err(ActionFailure::new(PANIC_CODE, message))
        });

        if let Err(failure) = &outcome {
            let _ = capture.note(&failure.message);
        }

        // All output is in the log before the terminal marker.
        capture.finish()?;

        let detail = outcome.as_ref().err().map(|f| f.message.clone());
        Ok(Invocation {
            failure: outcome.err(),
            skipped: false,
            detail,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkipCheck;
    use crate::logstream::read_log;
    use std::io::Write;
    use tempfile::TempDir;

    fn markers(log: &LogStream) -> Vec<LogEvent> {
        read_log(log.path())
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .filter(LogEvent::is_marker)
            .collect()
    }

    fn open(temp: &TempDir) -> LogStream {
        LogStream::open(temp.path().join("hostprep.log")).unwrap()
    }

    #[test]
    fn passing_action_writes_start_and_ok() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::from_fn("update", |out| {
                out.stdout_line("done").unwrap();
                Ok(())
            }))
            .unwrap();

        assert!(result.passed());
        assert_eq!(result.exit_code, None);
        assert_eq!(
            markers(&log),
            vec![
                LogEvent::StepStart {
                    step: "update".into()
                },
                LogEvent::StepOk {
                    step: "update".into()
                },
            ]
        );
    }

    #[test]
    fn failing_action_is_data_not_error() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::from_fn("firewall", |_| Err(ActionFailure::exit(3))))
            .unwrap();

        assert_eq!(result.status, StepStatus::Error);
        assert_eq!(result.exit_code, Some(3));
        assert!(markers(&log).contains(&LogEvent::StepError {
            step: "firewall".into(),
            code: 3
        }));
    }

    #[test]
    fn zero_code_failure_is_recorded_as_one() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::from_fn("odd", |_| Err(ActionFailure::new(0, "odd"))))
            .unwrap();

        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn panicking_action_is_contained() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::from_fn("boom", |out| {
                write!(out.stdout(), "partial").unwrap();
                panic!("kaboom");
            }))
            .unwrap();

        assert_eq!(result.exit_code, Some(PANIC_CODE));
        let detail = result.detail.unwrap();
        assert!(detail.contains("kaboom"));
        assert!(detail.contains("executor.rs:"), "{}", detail);
        assert!(!IN_ACTION.with(Cell::get));

        let captured = result.log_ref.read().unwrap();
        let partial = captured.find("boom | partial").unwrap();
        let error = captured.find("ERROR rc=101").unwrap();
        assert!(partial < error);
    }

    #[test]
    fn log_ref_covers_the_step() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        log.note("before").unwrap();
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::from_fn("s", |out| {
                out.stdout_line("hi")
                    .map_err(|e| ActionFailure::new(1, e.to_string()))
            }))
            .unwrap();

        let text = result.log_ref.read().unwrap();
        assert!(!text.contains("before"));
        assert!(text.contains("=== STEP s: START ==="));
        assert!(text.contains("s | hi"));
        assert!(text.trim_end().ends_with("=== STEP s: OK ==="));
    }

    #[test]
    fn satisfied_skip_check_passes_without_running() {
        let temp = TempDir::new().unwrap();
        let flag = temp.path().join("done.flag");
        std::fs::write(&flag, "").unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let step = Step::from_fn("once", |_| panic!("must not run")).with_skip_check(
            SkipCheck::FileExists {
                path: flag.to_string_lossy().into_owned(),
            },
        );
        let result = executor.execute(step).unwrap();

        assert!(result.passed());
        assert!(result.skipped);
        assert!(result.log_ref.read().unwrap().contains("already satisfied"));
    }

    #[test]
    fn force_ignores_skip_check() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions { force: true });

        let step = Step::from_fn("again", |_| Err(ActionFailure::exit(2))).with_skip_check(
            SkipCheck::FileExists {
                path: temp.path().to_string_lossy().into_owned(),
            },
        );
        let result = executor.execute(step).unwrap();

        assert!(!result.skipped);
        assert_eq!(result.exit_code, Some(2));
    }

    #[cfg(unix)]
    #[test]
    fn shell_step_output_is_captured() {
        let temp = TempDir::new().unwrap();
        let mut log = open(&temp);
        let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());

        let result = executor
            .execute(Step::shell("sh", "echo out; echo err >&2; exit 4"))
            .unwrap();

        assert_eq!(result.exit_code, Some(4));
        let text = result.log_ref.read().unwrap();
        assert!(text.contains("sh | out"));
        assert!(text.contains("sh ! err"));
    }
}
