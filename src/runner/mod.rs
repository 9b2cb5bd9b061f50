//! Run coordination and reporting.
//!
//! - [`RunCoordinator`] - runs registered steps in order, never short-circuiting
//! - [`RunStatusTable`] - step name to state, folded from log events
//! - [`RunReport`] - ordered rows plus the failure count and exit status
//! - [`summarize_log`] - the same report rebuilt from the log alone

pub mod coordinator;
pub mod replay;
pub mod report;
pub mod table;

pub use coordinator::{RunCoordinator, RunProgress, RunState};
pub use replay::{replay_latest, summarize_log};
pub use report::{ReportRow, RowStatus, RunReport, MAX_FAILURE_EXIT};
pub use table::{RunStatusTable, StepQuery, StepState};
