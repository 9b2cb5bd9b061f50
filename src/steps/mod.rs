//! Steps and their execution.
//!
//! - [`Step`] - a named unit of work wrapping an [`Action`]
//! - [`OutputCapture`] - the scoped stdout/stderr sinks an action writes to
//! - [`StepExecutor`] - runs one step and records its outcome in the log
//! - [`run_check`] - evaluates `skip_if` idempotence guards
//!
//! # Example
//!
//! ```no_run
//! use hostprep::logstream::LogStream;
//! use hostprep::steps::{ExecutionOptions, Step, StepExecutor, StepStatus};
//!
//! let mut log = LogStream::open("/var/log/hostprep.log").unwrap();
//! let mut executor = StepExecutor::new(&mut log, ExecutionOptions::default());
//!
//! let result = executor.execute(Step::shell("update", "apt-get update -y")).unwrap();
//! match result.status {
//!     StepStatus::Pass => println!("update passed"),
//!     StepStatus::Error => println!("update failed rc={:?}", result.exit_code),
//! }
//! ```

pub mod capture;
pub mod check;
pub mod executor;
pub mod result;
pub mod step;

pub use capture::{CaptureWriter, OutputCapture};
pub use check::{run_check, CheckResult};
pub use executor::{ExecutionOptions, StepExecutor, PANIC_CODE};
pub use result::{StepResult, StepStatus};
pub use step::{validate_step_name, Action, ActionFailure, ActionResult, ShellAction, Step};
