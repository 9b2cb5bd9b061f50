//! hostprep - idempotent, logged, resumable host provisioning.
//!
//! hostprep runs a declared list of provisioning steps in order. Each step's
//! output goes to a durable append-only log bracketed by unambiguous
//! START/OK/ERROR markers, a failing step never stops the steps after it,
//! and the summary of the most recent run can be rebuilt from the log alone
//! (for example at the next login, after the machine rebooted mid-run).
//!
//! # Modules
//!
//! - [`banner`] - Login-time summary hook
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Workflow file loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`logstream`] - The durable log: line format, writer, reader
//! - [`runner`] - Run coordination, status table, summary and replay
//! - [`shell`] - Shell command execution
//! - [`steps`] - Steps, output capture, and single-step execution
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use hostprep::logstream::parse_log;
//! use hostprep::runner::{replay_latest, RowStatus};
//! use std::path::Path;
//!
//! let log = "[2026-10-19T10:00:00Z] === RUN r1: START steps=update,docker ===\n\
//!            [2026-10-19T10:00:01Z] === STEP update: START ===\n\
//!            [2026-10-19T10:00:02Z] === STEP update: OK ===\n\
//!            [2026-10-19T10:00:03Z] === STEP docker: START ===\n";
//!
//! let report = replay_latest(&parse_log(log.as_bytes()), Path::new("hostprep.log")).unwrap();
//! assert_eq!(report.rows[0].status, RowStatus::Pass);
//! assert_eq!(report.rows[1].status, RowStatus::Interrupted);
//! assert_eq!(report.exit_code(), 1);
//! ```

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod logstream;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{HostprepError, Result};
